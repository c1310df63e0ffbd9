//! Bounded worker pool for sub-resource fetches.

use std::sync::Mutex;
use std::thread;

use tracing::{debug, warn};

/// Run `work` over `jobs` on at most `workers` scoped threads.
///
/// Workers pull from one shared queue, so a slow job never holds up the
/// others. Results come back in completion order; a job whose worker
/// panicked has no result.
pub fn run_pool<J, T, F>(jobs: Vec<J>, workers: usize, work: F) -> Vec<(J, T)>
where
    J: Send,
    T: Send,
    F: Fn(&J) -> T + Sync,
{
    let total = jobs.len();
    let workers = workers.clamp(1, total.max(1));
    let queue = Mutex::new(jobs.into_iter());
    let work = &work;
    let queue = &queue;

    debug!(jobs = total, workers, "pool started");
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        // A poisoned queue means another worker panicked; stop pulling.
                        let next = match queue.lock() {
                            Ok(mut jobs) => jobs.next(),
                            Err(_) => None,
                        };
                        let Some(job) = next else { break };
                        let result = work(&job);
                        done.push((job, result));
                    }
                    done
                })
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        for handle in handles {
            match handle.join() {
                Ok(done) => results.extend(done),
                Err(_) => warn!("pool worker panicked"),
            }
        }
        results
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_job_runs_once() {
        let calls = AtomicUsize::new(0);
        let mut results = run_pool((0..50).collect(), 4, |n: &u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            n * 2
        });
        results.sort();

        assert_eq!(calls.load(Ordering::SeqCst), 50);
        assert_eq!(results.len(), 50);
        assert!(results.iter().all(|(n, doubled)| *doubled == n * 2));
    }

    #[test]
    fn zero_workers_still_drains_the_queue() {
        let results = run_pool(vec!["a", "b"], 0, |s: &&str| s.len());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn no_jobs_no_results() {
        let results: Vec<(u8, u8)> = run_pool(Vec::new(), 8, |n: &u8| *n);
        assert!(results.is_empty());
    }

    #[test]
    fn concurrency_is_bounded() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run_pool((0..20).collect::<Vec<u32>>(), 3, |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(5));
            active.fetch_sub(1, Ordering::SeqCst);
        });
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
