// error taxonomy for the search engine

/// Errors the engine can return to a caller.
///
/// `OutOfBudget` and `GameOver` from the design notes are deliberately absent here: they are
/// normal termination conditions, not failures, and are represented as `Ok` values
/// ([`crate::tree::SearchReport`] and `Ok(None)` from [`crate::agent::Agent::genmove`]
/// respectively).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A caller-supplied parameter violated its documented constraint
    /// (`max_iter < 1`, `heuristic_ratio` outside `[0, 1]`, `rollout_threads < 1`, ...).
    /// The operation that raised this has no effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `GameState::apply` returned `None` for a move the engine itself dequeued from
    /// `legal_moves`. This indicates the `GameState` implementation is inconsistent;
    /// the search is aborted and the tree is left in its last valid, pre-mutation state.
    #[error("illegal transition: apply() produced no successor state for a legal move")]
    IllegalTransition,

    /// A user callback (`rollout`, `heuristic_rollout`, `evaluate_move`, `evaluate_position`,
    /// `apply`, ...) panicked. Caught at the rollout worker boundary (or, for inline execution,
    /// at the driver's direct call site) and turned into this variant so a panicking game never
    /// takes down the whole process.
    #[error("user callback failed: {0}")]
    UserCallbackFailure(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
