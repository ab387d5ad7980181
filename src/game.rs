// the contract a user-supplied game must satisfy to be searched by this engine

use std::fmt;

/// A single legal transition between two [`GameState`]s.
///
/// Moves are value types: the engine compares them by `Eq` (to match a caller-supplied
/// "enemy move" against a child of the root when advancing the tree, see
/// [`crate::tree::Tree::advance_tree`]) and prints them via `Display` for diagnostics.
pub trait Move: Clone + Eq + Send + Sync + fmt::Display {}

impl<T> Move for T where T: Clone + Eq + Send + Sync + fmt::Display {}

/// The abstract game the search tree is built over.
///
/// Implementations are expected to be pure and total except where documented otherwise.
/// `Clone` must produce an independent deep copy: the engine hands clones to rollout workers
/// (§5) and relies on mutations to one copy never being observed through another.
///
/// `Send + Sync` are required because [`rollout`](GameState::rollout) and
/// [`heuristic_rollout`](GameState::heuristic_rollout) may run on a worker thread of the
/// job scheduler (see [`crate::scheduler`]).
pub trait GameState: Clone + Send + Sync + fmt::Display {
    type Move: Move;

    /// Enumerate legal moves from this state, in the order that becomes the expansion order.
    /// Must be empty iff `terminal(self)`.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Apply `mv` and return the resulting state. `mv` must have been produced by
    /// `legal_moves(self)`. Returning `None` signals an illegal transition and is fatal
    /// to the current search (see [`crate::error::EngineError::IllegalTransition`]).
    fn apply(&self, mv: &Self::Move) -> Option<Self>
    where
        Self: Sized;

    /// Whether this state ends the game. Pure; stable for a given state.
    fn terminal(&self) -> bool;

    /// Whether the *self side* (the side whose win probability this engine optimizes)
    /// moves next from this state. Required to orient the UCT winrate calculation.
    fn self_side_turn(&self) -> bool;

    /// Run one simulation from this state to completion and return the self-side win
    /// probability in `[0.0, 1.0]`. May use randomness. Must be safe to call from any thread
    /// when parallel rollouts are enabled (§5) — the engine always hands a fresh clone to each
    /// worker, so no synchronization with other in-flight rollouts is required.
    fn rollout(&self) -> f64;

    /// A cheaper or more informed rollout used by the `Heuristic`/`Heavy` and (probabilistically)
    /// `Mixed` rollout strategies. Defaults to [`rollout`](GameState::rollout).
    fn heuristic_rollout(&self) -> f64 {
        self.rollout()
    }

    /// Advisory score in `[0.0, 1.0]` for playing `mv` from this state. Used only by expansion
    /// policies that order the untried-move queue by quality; the default ordering from
    /// `legal_moves` does not consult this. Defaults to 0.
    fn evaluate_move(&self, _mv: &Self::Move) -> f64 {
        0.0
    }

    /// Advisory score in `[0.0, 1.0]` for this position. Defaults to 0.5 (neutral).
    fn evaluate_position(&self) -> f64 {
        0.5
    }
}
