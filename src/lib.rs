pub mod agent;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
mod rollout;
mod scheduler;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::Agent;
pub use config::{
    get_heuristic_ratio, get_rollout_strategy, get_rollout_threads, optimal_thread_count,
    set_heuristic_ratio, set_rollout_strategy, set_rollout_threads, RolloutStrategy,
};
pub use error::{EngineError, Result};
pub use game::{GameState, Move};
pub use tree::{Node, SearchReport, StopReason, Tree, DEFAULT_EXPLORATION_CONSTANT};
