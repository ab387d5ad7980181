// dispatches simulation calls through the configured rollout strategy and fans them out
// across the job scheduler (§4.2, §4.3)

use rand::Rng;

use crate::config::{self, RolloutStrategy};
use crate::error::Result;
use crate::game::GameState;
use crate::scheduler::{self, RolloutJob};

fn run_strategy<G: GameState>(state: &G, strategy: RolloutStrategy, heuristic_ratio: f64) -> f64 {
    match strategy {
        RolloutStrategy::Random => state.rollout(),
        RolloutStrategy::Heuristic | RolloutStrategy::Heavy => state.heuristic_rollout(),
        RolloutStrategy::Mixed => {
            if rand::rng().random::<f64>() < heuristic_ratio {
                state.heuristic_rollout()
            } else {
                state.rollout()
            }
        }
    }
}

/// Produce `k` independent simulation scores from `state` under the process-wide rollout
/// strategy and return their sum. When more than one worker thread is configured, `k` rollouts
/// are split as evenly as possible across `min(k, threads)` parallel jobs; with one thread
/// (or a single rollout) the work runs inline with no thread involved at all.
pub(crate) fn rollout_batch<G: GameState>(state: &G, k: usize) -> Result<f64> {
    debug_assert!(k > 0, "rollout_batch called with a zero-size batch");
    let threads = config::get_rollout_threads();
    let strategy = config::get_rollout_strategy();
    let heuristic_ratio = config::get_heuristic_ratio();

    let n_jobs = k.min(threads).max(1);
    let base = k / n_jobs;
    let remainder = k % n_jobs;

    let jobs: Vec<RolloutJob> = (0..n_jobs)
        .filter_map(|job_index| {
            let rollouts_in_job = base + usize::from(job_index < remainder);
            if rollouts_in_job == 0 {
                return None;
            }
            let state = state.clone();
            let job: RolloutJob = Box::new(move || {
                (0..rollouts_in_job)
                    .map(|_| run_strategy(&state, strategy, heuristic_ratio))
                    .sum()
            });
            Some(job)
        })
        .collect();

    let results = scheduler::submit_batch(threads, jobs);
    results.into_iter().try_fold(0.0, |acc, r| r.map(|v| acc + v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CONFIG_TEST_MUTEX;

    #[derive(Clone)]
    struct CountingState {
        value: f64,
    }

    impl std::fmt::Display for CountingState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.value)
        }
    }

    impl GameState for CountingState {
        type Move = u8;

        fn legal_moves(&self) -> Vec<Self::Move> {
            vec![]
        }
        fn apply(&self, _mv: &Self::Move) -> Option<Self> {
            Some(self.clone())
        }
        fn terminal(&self) -> bool {
            true
        }
        fn self_side_turn(&self) -> bool {
            true
        }
        fn rollout(&self) -> f64 {
            self.value
        }
        fn heuristic_rollout(&self) -> f64 {
            self.value * 2.0
        }
    }

    #[test]
    fn random_strategy_sums_k_independent_rollouts() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        config::set_rollout_strategy(RolloutStrategy::Random);
        config::set_rollout_threads(1).unwrap();
        let state = CountingState { value: 0.5 };
        let total = rollout_batch(&state, 4).unwrap();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn heuristic_strategy_routes_through_heuristic_rollout() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        config::set_rollout_strategy(RolloutStrategy::Heuristic);
        config::set_rollout_threads(1).unwrap();
        let state = CountingState { value: 0.5 };
        let total = rollout_batch(&state, 3).unwrap();
        assert_eq!(total, 3.0);
        config::set_rollout_strategy(RolloutStrategy::Random);
    }

    #[test]
    fn batch_splits_across_threads_without_losing_rollouts() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        config::set_rollout_strategy(RolloutStrategy::Random);
        config::set_rollout_threads(8).unwrap();
        let state = CountingState { value: 1.0 };
        let total = rollout_batch(&state, 5).unwrap();
        assert_eq!(total, 5.0);
        config::set_rollout_threads(1).unwrap();
    }
}
