// game-playing façade: maintains one tree across a whole game, advancing it move by move (§4.5)

use crate::error::{EngineError, Result};
use crate::game::GameState;
use crate::tree::Tree;

const DEFAULT_MAX_ITER: u64 = 100_000;
const DEFAULT_MAX_SECONDS: f64 = 30.0;

/// Owns a [`Tree`] plus the two search budgets, and advances the root across successive moves
/// of a single game.
pub struct Agent<G: GameState> {
    tree: Tree<G>,
    max_iter: u64,
    max_seconds: f64,
}

impl<G: GameState> Agent<G> {
    pub fn new(initial_state: G) -> Self {
        Agent {
            tree: Tree::new(initial_state),
            max_iter: DEFAULT_MAX_ITER,
            max_seconds: DEFAULT_MAX_SECONDS,
        }
    }

    /// `max_iter` must be >= 1 and `max_seconds` must be > 0; violating either is reported here
    /// at the entry point rather than silently accepted (§7).
    pub fn with_budget(initial_state: G, max_iter: u64, max_seconds: f64) -> Result<Self> {
        if max_iter < 1 {
            return Err(EngineError::InvalidArgument(
                "max_iter must be >= 1".to_string(),
            ));
        }
        if max_seconds <= 0.0 {
            return Err(EngineError::InvalidArgument(
                "max_seconds must be > 0".to_string(),
            ));
        }
        Ok(Agent {
            tree: Tree::new(initial_state),
            max_iter,
            max_seconds,
        })
    }

    pub fn current_state(&self) -> &G {
        self.tree.root().state()
    }

    /// Incorporate `enemy_move` (advancing the tree, or rebuilding from `current_state().apply`
    /// if it was never a child of the root), grow the tree under the configured budget, pick the
    /// best root child by visit count, advance to it, and return its move.
    ///
    /// Returns `Ok(None)` without searching if the (possibly just-advanced) root is terminal.
    pub fn genmove(&mut self, enemy_move: Option<&G::Move>) -> Result<Option<G::Move>> {
        if let Some(mv) = enemy_move {
            if self.tree.advance_tree(mv).is_none() {
                let next_state = self
                    .current_state()
                    .apply(mv)
                    .ok_or(crate::error::EngineError::IllegalTransition)?;
                tracing::warn!("enemy move was not a known child; rebuilding tree from scratch");
                self.tree.reset(next_state);
            }
        }

        if self.current_state().terminal() {
            return Ok(None);
        }

        let report = self
            .tree
            .grow_tree(Some(self.max_iter), Some(self.max_seconds))?;
        tracing::debug!(
            iterations = report.iterations_run,
            stop_reason = ?report.stop_reason,
            "genmove search finished"
        );

        let best = self
            .tree
            .select_best_child()
            .expect("grow_tree on a non-terminal root always expands at least one child");
        let mv = best
            .get_move()
            .expect("a non-root child always carries the move that produced it")
            .clone();
        self.tree
            .advance_tree(&mv)
            .expect("best child was just read from this root's own children");
        Ok(Some(mv))
    }

    /// Log root and child statistics at `info`/`debug` level (§4.5, §6).
    pub fn feedback(&self) {
        self.tree.print_stats();
    }
}
