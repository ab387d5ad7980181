// fixed-size worker pool executing independent rollout jobs in parallel (§4.3)

use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::EngineError;

/// A rollout job: a closure over a state snapshot that produces a reward sum. Boxed so the
/// scheduler can hold jobs over arbitrary `GameState` rollout closures without being generic.
pub(crate) type RolloutJob = Box<dyn FnOnce() -> f64 + Send + 'static>;

type QueuedJob = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<QueuedJob>>,
    queue_cv: Condvar,
    shutdown: Mutex<bool>,
}

/// A fixed pool of worker threads draining a single FIFO job queue.
///
/// Workers never touch the search tree; they only execute the closure handed to them and write
/// its result into a dedicated slot (see [`ThreadPool::run_batch`]). Dropping the pool flips the
/// shutdown flag, wakes every worker, and joins them once the queue has drained.
pub(crate) struct ThreadPool {
    size: usize,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    fn new(size: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            shutdown: Mutex::new(false),
        });
        let workers = (0..size)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("mcts-rollout-{id}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn rollout worker thread")
            })
            .collect();
        tracing::debug!(threads = size, "spawned rollout worker pool");
        ThreadPool {
            size,
            shared,
            workers,
        }
    }

    fn size(&self) -> usize {
        self.size
    }

    /// Submit `jobs` and block until every job has run, returning one result per job in the
    /// original order. The barrier is exact: this only returns once every job's result slot has
    /// been filled.
    fn run_batch(&self, jobs: Vec<RolloutJob>) -> Vec<Result<f64, EngineError>> {
        let n = jobs.len();
        let slots: Arc<Vec<Mutex<Option<Result<f64, EngineError>>>>> =
            Arc::new((0..n).map(|_| Mutex::new(None)).collect());
        let remaining = Arc::new((Mutex::new(n), Condvar::new()));

        {
            let mut queue = self.shared.queue.lock().expect("job queue lock poisoned");
            for (index, job) in jobs.into_iter().enumerate() {
                let slots = Arc::clone(&slots);
                let remaining = Arc::clone(&remaining);
                queue.push_back(Box::new(move || {
                    let outcome = run_job_catching_panics(job);
                    *slots[index].lock().expect("result slot lock poisoned") = Some(outcome);
                    let (count, cv) = &*remaining;
                    let mut count = count.lock().expect("batch counter lock poisoned");
                    *count -= 1;
                    if *count == 0 {
                        cv.notify_all();
                    }
                }));
            }
        }
        self.shared.queue_cv.notify_all();

        let (count, cv) = &*remaining;
        let mut count = count.lock().expect("batch counter lock poisoned");
        while *count > 0 {
            count = cv.wait(count).expect("batch condvar wait poisoned");
        }
        drop(count);

        Arc::try_unwrap(slots)
            .unwrap_or_else(|_| panic!("rollout worker still holds a result slot reference past the batch barrier"))
            .into_iter()
            .map(|slot| {
                slot.into_inner()
                    .expect("result slot lock poisoned")
                    .expect("worker did not fill result slot before barrier release")
            })
            .collect()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        *self.shared.shutdown.lock().expect("shutdown flag lock poisoned") = true;
        self.shared.queue_cv.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        tracing::debug!("rollout worker pool shut down");
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let mut queue = shared.queue.lock().expect("job queue lock poisoned");
        loop {
            if let Some(job) = queue.pop_front() {
                drop(queue);
                job();
                break;
            }
            if *shared.shutdown.lock().expect("shutdown flag lock poisoned") {
                return;
            }
            queue = shared
                .queue_cv
                .wait(queue)
                .expect("job queue condvar wait poisoned");
        }
    }
}

fn run_job_catching_panics(job: RolloutJob) -> Result<f64, EngineError> {
    panic::catch_unwind(AssertUnwindSafe(job)).map_err(|payload| {
        EngineError::UserCallbackFailure(panic_message(payload))
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rollout callback panicked with a non-string payload".to_string()
    }
}

static POOL: Lazy<Mutex<Option<ThreadPool>>> = Lazy::new(|| Mutex::new(None));

/// Run `jobs` to completion, using a `threads`-worker pool when there is more than one job to
/// parallelize and `threads > 1`, or inline on the calling thread otherwise (T=1 degenerates to
/// in-line execution with no thread creation, per §4.3).
///
/// The pool is lazily created on first use and transparently rebuilt (the old pool is dropped,
/// which joins its workers cleanly) whenever the requested thread count changes.
pub(crate) fn submit_batch(threads: usize, jobs: Vec<RolloutJob>) -> Vec<Result<f64, EngineError>> {
    if threads <= 1 || jobs.len() <= 1 {
        return jobs.into_iter().map(run_job_catching_panics).collect();
    }

    let mut guard = POOL.lock().expect("global scheduler pool lock poisoned");
    let needs_new = !matches!(guard.as_ref(), Some(pool) if pool.size() == threads);
    if needs_new {
        *guard = Some(ThreadPool::new(threads));
    }
    guard
        .as_ref()
        .expect("pool was just initialized above")
        .run_batch(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_barrier_waits_for_every_job() {
        let jobs: Vec<RolloutJob> = (0..20)
            .map(|i| -> RolloutJob { Box::new(move || i as f64) })
            .collect();
        let results = submit_batch(4, jobs);
        assert_eq!(results.len(), 20);
        let sum: f64 = results.into_iter().map(|r| r.unwrap()).sum();
        assert_eq!(sum, (0..20).sum::<i32>() as f64);
    }

    #[test]
    fn inline_execution_for_single_thread() {
        let jobs: Vec<RolloutJob> = vec![Box::new(|| 1.0), Box::new(|| 2.0)];
        let results = submit_batch(1, jobs);
        assert_eq!(results.into_iter().map(|r| r.unwrap()).sum::<f64>(), 3.0);
    }

    #[test]
    fn panicking_job_is_reported_not_propagated_as_a_process_panic() {
        let jobs: Vec<RolloutJob> = vec![
            Box::new(|| 1.0),
            Box::new(|| panic!("boom")),
            Box::new(|| 3.0),
        ];
        let results = submit_batch(3, jobs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::UserCallbackFailure(_))));
        assert!(results[2].is_ok());
    }
}
