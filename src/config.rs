// process-wide rollout configuration and thread-count knobs (§4.2, §6)

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::EngineError;

/// Which callback a simulation call routes through (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloutStrategy {
    /// Always call `GameState::rollout`.
    #[default]
    Random,
    /// Always call `GameState::heuristic_rollout`.
    Heuristic,
    /// Call `heuristic_rollout` with probability `heuristic_ratio`, `rollout` otherwise.
    Mixed,
    /// Reserved for a future deeper-evaluation variant; currently equivalent to `Heuristic`.
    Heavy,
}

struct RolloutConfigState {
    strategy: RolloutStrategy,
    heuristic_ratio: f64,
}

static ROLLOUT_CONFIG: Lazy<RwLock<RolloutConfigState>> = Lazy::new(|| {
    RwLock::new(RolloutConfigState {
        strategy: RolloutStrategy::default(),
        heuristic_ratio: 0.5,
    })
});

// 0 is the "unset" sentinel: get_rollout_threads() falls back to optimal_thread_count().
static ROLLOUT_THREADS: AtomicUsize = AtomicUsize::new(0);

/// Platform hardware concurrency, or 1 if it cannot be determined.
pub fn optimal_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Number of rollout worker threads. `n` must be >= 1.
///
/// Idempotent; behavior is undefined if called concurrently with an in-flight search (§4.2).
pub fn set_rollout_threads(n: usize) -> Result<(), EngineError> {
    if n < 1 {
        return Err(EngineError::InvalidArgument(
            "rollout_threads must be >= 1".to_string(),
        ));
    }
    ROLLOUT_THREADS.store(n, Ordering::SeqCst);
    tracing::debug!(threads = n, "rollout thread count updated");
    Ok(())
}

pub fn get_rollout_threads() -> usize {
    match ROLLOUT_THREADS.load(Ordering::SeqCst) {
        0 => optimal_thread_count(),
        n => n,
    }
}

pub fn set_rollout_strategy(strategy: RolloutStrategy) {
    ROLLOUT_CONFIG.write().expect("rollout config lock poisoned").strategy = strategy;
    tracing::debug!(?strategy, "rollout strategy updated");
}

pub fn get_rollout_strategy() -> RolloutStrategy {
    ROLLOUT_CONFIG.read().expect("rollout config lock poisoned").strategy
}

/// Fraction of `Mixed`-strategy simulations that route through `heuristic_rollout`. `r` must
/// lie in `[0, 1]`.
pub fn set_heuristic_ratio(r: f64) -> Result<(), EngineError> {
    if !(0.0..=1.0).contains(&r) {
        return Err(EngineError::InvalidArgument(
            "heuristic_ratio must lie in [0, 1]".to_string(),
        ));
    }
    ROLLOUT_CONFIG
        .write()
        .expect("rollout config lock poisoned")
        .heuristic_ratio = r;
    Ok(())
}

pub fn get_heuristic_ratio() -> f64 {
    ROLLOUT_CONFIG
        .read()
        .expect("rollout config lock poisoned")
        .heuristic_ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CONFIG_TEST_MUTEX;

    #[test]
    fn heuristic_ratio_rejects_out_of_range() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        assert!(set_heuristic_ratio(-0.1).is_err());
        assert!(set_heuristic_ratio(1.1).is_err());
        assert!(set_heuristic_ratio(0.5).is_ok());
        assert_eq!(get_heuristic_ratio(), 0.5);
    }

    #[test]
    fn rollout_threads_rejects_zero() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        assert!(set_rollout_threads(0).is_err());
        assert!(set_rollout_threads(4).is_ok());
        assert_eq!(get_rollout_threads(), 4);
    }

    #[test]
    fn strategy_round_trips() {
        let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
        set_rollout_strategy(RolloutStrategy::Heuristic);
        assert_eq!(get_rollout_strategy(), RolloutStrategy::Heuristic);
        set_rollout_strategy(RolloutStrategy::Random);
    }
}
