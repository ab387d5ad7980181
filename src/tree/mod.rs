// search tree: owns exactly one root node and drives the four-phase UCT loop (§4.4, §4.5)

mod node;

pub use node::{Node, DEFAULT_EXPLORATION_CONSTANT};

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::{EngineError, Result};
use crate::game::GameState;

/// Why [`Tree::grow_tree`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration cap was reached.
    IterationBudgetExhausted,
    /// The wall-clock cap was exceeded (sampled between iterations only).
    TimeBudgetExhausted,
    /// The root is terminal or has no remaining untried moves anywhere reachable from it in a
    /// single step and selection could not find a node to expand — in practice this only
    /// happens when the root itself is terminal.
    TreeExhausted,
}

/// Outcome of a `grow_tree` call. `OutOfBudget` (§7) is not an error: it is this normal `Ok`
/// return describing which budget ran out first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub iterations_run: u64,
    pub stop_reason: StopReason,
}

/// Owns one root [`Node`] and runs the UCT search loop over it.
pub struct Tree<G: GameState> {
    root: Rc<Node<G>>,
    exploration_constant: f64,
}

impl<G: GameState> Tree<G> {
    pub fn new(initial_state: G) -> Self {
        Tree {
            root: Node::new_root(initial_state),
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
        }
    }

    pub fn with_exploration_constant(initial_state: G, exploration_constant: f64) -> Self {
        Tree {
            root: Node::new_root(initial_state),
            exploration_constant,
        }
    }

    pub fn root(&self) -> &Rc<Node<G>> {
        &self.root
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Grow the tree until `max_iter` iterations have run or `max_seconds` has elapsed,
    /// whichever comes first. Either bound may be `None` for "no cap" (but not both, in
    /// practice: an uncapped, iteration-uncapped search never returns until the tree is
    /// terminal-exhausted).
    pub fn grow_tree(&self, max_iter: Option<u64>, max_seconds: Option<f64>) -> Result<SearchReport> {
        if max_iter == Some(0) {
            return Err(EngineError::InvalidArgument(
                "max_iter must be >= 1".to_string(),
            ));
        }
        if matches!(max_seconds, Some(s) if s <= 0.0) {
            return Err(EngineError::InvalidArgument(
                "max_seconds must be > 0".to_string(),
            ));
        }

        let start = Instant::now();
        let max_duration = max_seconds.map(Duration::from_secs_f64);
        let mut iterations_run = 0u64;

        loop {
            if let Some(cap) = max_iter {
                if iterations_run >= cap {
                    return Ok(SearchReport {
                        iterations_run,
                        stop_reason: StopReason::IterationBudgetExhausted,
                    });
                }
            }
            if let Some(cap) = max_duration {
                if start.elapsed() >= cap {
                    return Ok(SearchReport {
                        iterations_run,
                        stop_reason: StopReason::TimeBudgetExhausted,
                    });
                }
            }

            if self.root.is_terminal() {
                return Ok(SearchReport {
                    iterations_run,
                    stop_reason: StopReason::TreeExhausted,
                });
            }

            self.run_one_iteration()?;
            iterations_run += 1;
        }
    }

    fn run_one_iteration(&self) -> Result<()> {
        // Select: descend while fully expanded and non-terminal.
        let mut selected = Rc::clone(&self.root);
        while !selected.is_terminal() && selected.is_fully_expanded() {
            selected = selected
                .select_best_child(self.exploration_constant)
                .expect("a fully expanded non-terminal node always has at least one child");
        }

        // Expand: terminal stopping nodes simulate themselves in place.
        let leaf = if selected.is_terminal() {
            selected
        } else {
            selected.expand()?
        };

        // Simulate.
        let k = 1;
        let reward_sum = leaf.rollout_batch(k)?;

        // Backpropagate.
        leaf.backpropagate(reward_sum, k as u64);
        tracing::debug!(
            visits = leaf.visits(),
            score = leaf.score(),
            "completed search iteration"
        );
        Ok(())
    }

    /// Root child with the highest visit count (ties by lowest index). This differs
    /// deliberately from the UCT-based selection used internally (§4.5, §9).
    pub fn select_best_child(&self) -> Option<Rc<Node<G>>> {
        self.root
            .children()
            .into_iter()
            .max_by_key(|child| child.visits())
    }

    /// Locate the unique child whose move equals `mv`, detach it, and make it the new root.
    /// Returns `None` if no child matches — the caller is expected to rebuild the tree from a
    /// fresh state in that case (§4.4).
    pub fn advance_tree(&mut self, mv: &G::Move) -> Option<()> {
        let child = self
            .root
            .children()
            .into_iter()
            .find(|c| c.get_move() == Some(mv))?;
        self.root = child;
        Some(())
    }

    /// Replace the tree with a fresh root over `state`, discarding all prior search history.
    pub fn reset(&mut self, state: G) {
        self.root = Node::new_root(state);
    }

    pub fn print_stats(&self) {
        tracing::info!(
            size = self.root.size(),
            visits = self.root.visits(),
            score = self.root.score(),
            children = self.root.children().len(),
            "tree stats"
        );
        for child in self.root.children() {
            if let Some(mv) = child.get_move() {
                tracing::info!(
                    %mv,
                    visits = child.visits(),
                    score = child.score(),
                    "child stats"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Clone, PartialEq, Eq)]
    struct Mv(u8);

    impl fmt::Display for Mv {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone)]
    struct Counter {
        value: u8,
        limit: u8,
    }

    impl fmt::Display for Counter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}/{}", self.value, self.limit)
        }
    }

    impl GameState for Counter {
        type Move = Mv;

        fn legal_moves(&self) -> Vec<Self::Move> {
            if self.value >= self.limit {
                vec![]
            } else {
                (self.value..self.limit).map(Mv).collect()
            }
        }
        fn apply(&self, mv: &Self::Move) -> Option<Self> {
            Some(Counter {
                value: mv.0 + 1,
                limit: self.limit,
            })
        }
        fn terminal(&self) -> bool {
            self.value >= self.limit
        }
        fn self_side_turn(&self) -> bool {
            true
        }
        fn rollout(&self) -> f64 {
            if self.value >= self.limit {
                1.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn grow_tree_respects_iteration_budget() {
        let tree = Tree::new(Counter { value: 0, limit: 5 });
        let report = tree.grow_tree(Some(10), None).unwrap();
        assert_eq!(report.iterations_run, 10);
        assert_eq!(report.stop_reason, StopReason::IterationBudgetExhausted);
    }

    #[test]
    fn grow_tree_rejects_zero_max_iter() {
        let tree = Tree::new(Counter { value: 0, limit: 5 });
        let err = tree.grow_tree(Some(0), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn grow_tree_rejects_non_positive_max_seconds() {
        let tree = Tree::new(Counter { value: 0, limit: 5 });
        let err = tree.grow_tree(None, Some(0.0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn grow_tree_stops_when_root_is_terminal() {
        let tree = Tree::new(Counter { value: 5, limit: 5 });
        let report = tree.grow_tree(Some(100), None).unwrap();
        assert_eq!(report.iterations_run, 0);
        assert_eq!(report.stop_reason, StopReason::TreeExhausted);
    }

    #[test]
    fn advance_tree_moves_root_to_matching_child_and_keeps_its_subtree() {
        let mut tree = Tree::new(Counter { value: 0, limit: 3 });
        tree.grow_tree(Some(20), None).unwrap();
        let chosen = tree.select_best_child().unwrap();
        let mv = chosen.get_move().unwrap().clone();
        let pre_advance_size = chosen.size();
        assert!(tree.advance_tree(&mv).is_some());
        assert_eq!(tree.root().get_move(), Some(&mv));
        assert_eq!(tree.size(), pre_advance_size);
    }

    #[test]
    fn advance_tree_returns_none_for_a_move_that_was_never_expanded() {
        let mut tree = Tree::new(Counter { value: 0, limit: 3 });
        assert!(tree.advance_tree(&Mv(255)).is_none());
    }

    #[test]
    fn size_invariant_holds_after_growth() {
        let tree = Tree::new(Counter { value: 0, limit: 4 });
        tree.grow_tree(Some(30), None).unwrap();

        fn check_size<G: GameState>(node: &Rc<Node<G>>) -> usize {
            let mut total = 1;
            for child in node.children() {
                total += check_size(&child);
            }
            assert_eq!(node.size(), total, "size invariant violated");
            total
        }
        check_size(tree.root());
    }
}
