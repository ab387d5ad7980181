// shared test-only plumbing

use once_cell::sync::Lazy;
use std::sync::Mutex;

/// `RolloutConfig` and the rollout thread count are process-wide (§9 design notes). Tests that
/// mutate either must serialize behind this mutex so they don't observe each other's writes.
pub static CONFIG_TEST_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
