//! Thread-per-task dispatch over one lock-protected shared state.
//!
//! Used by the call sites whose workers block (sleeping, polling) or append
//! to a shared container. Each [`Task`] gets its own scoped OS thread and a
//! reference to the same `Mutex<S>`. The dispatcher joins every thread before
//! returning the state by value, then surfaces the first failure.
//!
//! `parking_lot` guards release on every exit path, including unwinding, so a
//! task that fails or panics inside its critical section never leaves the
//! lock held for the others.

use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::join_outcomes;
use crate::error::{EngineError, EngineResult, panic_message};
use crate::observability::record_unit_completed;

/// A named unit of work that runs against the shared state.
pub struct Task<F> {
    /// Worker name, used for the thread name, logs, and errors.
    pub name: String,
    /// The work itself.
    pub run: F,
}

impl<F> Task<F> {
    /// Create a task.
    pub fn new(name: impl Into<String>, run: F) -> Self {
        Self {
            name: name.into(),
            run,
        }
    }
}

/// Runs tasks concurrently against one shared state.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    call_site: &'static str,
}

impl Dispatcher {
    /// Create a dispatcher labelled `call_site` in logs and metrics.
    #[must_use]
    pub const fn new(call_site: &'static str) -> Self {
        Self { call_site }
    }

    /// Run every task on its own thread and return the final state.
    ///
    /// All threads are joined before this returns, whether or not any of them
    /// failed.
    pub fn run<S, F>(&self, state: S, tasks: Vec<Task<F>>) -> EngineResult<S>
    where
        S: Send,
        F: FnOnce(&Mutex<S>) -> Result<(), String> + Send,
    {
        let shared = Mutex::new(state);
        let call_site = self.call_site;

        info!(call_site, tasks = tasks.len(), "Dispatching worker threads");
        let started = Instant::now();

        let outcomes: Vec<EngineResult<()>> = thread::scope(|scope| {
            let handles: Vec<_> = tasks
                .into_iter()
                .map(|task| {
                    let shared = &shared;
                    let run = task.run;
                    let handle = thread::Builder::new()
                        .name(task.name.clone())
                        .spawn_scoped(scope, move || {
                            let unit_started = Instant::now();
                            let outcome = run(shared);
                            (outcome, unit_started.elapsed())
                        });
                    (task.name, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let handle = handle.map_err(|e| {
                        EngineError::computation_failed(&name, format!("failed to spawn: {e}"))
                    })?;
                    match handle.join() {
                        Ok((outcome, elapsed)) => {
                            record_unit_completed(call_site, outcome.is_ok(), elapsed.as_secs_f64());
                            outcome.map_err(|message| {
                                warn!(call_site, unit = %name, error = %message, "Worker failed");
                                EngineError::computation_failed(&name, message)
                            })?;
                            debug!(call_site, unit = %name, "Worker joined");
                            Ok(())
                        }
                        Err(payload) => {
                            record_unit_completed(call_site, false, 0.0);
                            let message = panic_message(payload.as_ref());
                            warn!(call_site, unit = %name, error = %message, "Worker panicked");
                            Err(EngineError::worker_panicked(&name, message))
                        }
                    }
                })
                .collect()
        });

        join_outcomes(call_site, outcomes)?;
        info!(
            call_site,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All workers joined"
        );

        Ok(shared.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorCode;

    type Work = Box<dyn FnOnce(&Mutex<Vec<usize>>) -> Result<(), String> + Send>;

    #[test]
    fn test_all_tasks_append_under_lock() {
        let tasks: Vec<Task<Work>> = (0..8)
            .map(|i| {
                let work: Work = Box::new(move |state: &Mutex<Vec<usize>>| {
                    for j in 0..10 {
                        state.lock().push(i * 10 + j);
                    }
                    Ok(())
                });
                Task::new(format!("task-{i}"), work)
            })
            .collect();

        let mut result = Dispatcher::new("test").run(Vec::new(), tasks).unwrap();
        result.sort_unstable();

        assert_eq!(result, (0..80).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_waits_for_slow_tasks() {
        let slow: Work = Box::new(|state: &Mutex<Vec<usize>>| {
            thread::sleep(Duration::from_millis(50));
            state.lock().push(1);
            Ok(())
        });
        let failing: Work = Box::new(|_: &Mutex<Vec<usize>>| Err("refused".to_string()));
        let tasks = vec![Task::new("failing", failing), Task::new("slow", slow)];

        let err = Dispatcher::new("test")
            .run(Vec::new(), tasks)
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ComputationFailed);
        assert_eq!(err.unit(), Some("failing"));
    }

    #[test]
    fn test_panic_inside_critical_section_releases_lock() {
        let panicking: Work = Box::new(|state: &Mutex<Vec<usize>>| {
            let mut guard = state.lock();
            guard.push(0);
            panic!("crashed while holding the lock");
        });
        let follower: Work = Box::new(|state: &Mutex<Vec<usize>>| {
            thread::sleep(Duration::from_millis(20));
            state.lock().push(1);
            Ok(())
        });
        let tasks = vec![Task::new("crasher", panicking), Task::new("follower", follower)];

        // The follower would block forever if the crasher's guard leaked.
        let err = Dispatcher::new("test")
            .run(Vec::new(), tasks)
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::WorkerPanicked);
        assert_eq!(err.unit(), Some("crasher"));
    }

    #[test]
    fn test_empty_task_list_returns_state() {
        let tasks: Vec<Task<Work>> = Vec::new();
        let result = Dispatcher::new("test").run(vec![7], tasks).unwrap();
        assert_eq!(result, vec![7]);
    }
}
