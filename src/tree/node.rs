// search-tree vertex: owned state, untried-move queue, children, and UCT statistics (§4.4)

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::error::{EngineError, Result};
use crate::game::GameState;
use crate::rollout;

/// Default UCT exploration constant, `sqrt(2)`.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// One vertex of the search tree.
///
/// Children own their subtree (`Rc`); the parent link is a non-owning [`Weak`] so that a chain
/// of strong references never forms a cycle back up the tree (§4.4, §9 "Ownership of a dynamic
/// graph"). Dropping the last `Rc` to a node recursively drops its children, its state, its move
/// and anything left in its untried-move queue — there is no manual free path to get wrong.
pub struct Node<G: GameState> {
    state: G,
    mv: Option<G::Move>,
    parent: RefCell<Weak<Node<G>>>,
    children: RefCell<Vec<Rc<Node<G>>>>,
    untried_actions: RefCell<VecDeque<G::Move>>,
    terminal: bool,
    visits: Cell<u64>,
    score: Cell<f64>,
    size: Cell<usize>,
}

impl<G: GameState> Node<G> {
    /// Build a fresh root node owning `state`.
    pub fn new_root(state: G) -> Rc<Self> {
        Self::build(state, None, Weak::new())
    }

    fn new_child(parent: &Rc<Self>, state: G, mv: G::Move) -> Rc<Self> {
        Self::build(state, Some(mv), Rc::downgrade(parent))
    }

    fn build(state: G, mv: Option<G::Move>, parent: Weak<Self>) -> Rc<Self> {
        let terminal = state.terminal();
        let untried_actions = if terminal {
            VecDeque::new()
        } else {
            state.legal_moves().into_iter().collect()
        };
        Rc::new(Node {
            state,
            mv,
            parent: RefCell::new(parent),
            children: RefCell::new(Vec::new()),
            untried_actions: RefCell::new(untried_actions),
            terminal,
            visits: Cell::new(0),
            score: Cell::new(0.0),
            size: Cell::new(1),
        })
    }

    pub fn state(&self) -> &G {
        &self.state
    }

    pub fn get_move(&self) -> Option<&G::Move> {
        self.mv.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// `untried_actions` is empty or the node is terminal (§3 invariant).
    pub fn is_fully_expanded(&self) -> bool {
        self.terminal || self.untried_actions.borrow().is_empty()
    }

    pub fn visits(&self) -> u64 {
        self.visits.get()
    }

    pub fn score(&self) -> f64 {
        self.score.get()
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    pub fn children(&self) -> Vec<Rc<Node<G>>> {
        self.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<Rc<Node<G>>> {
        self.parent.borrow().upgrade()
    }

    /// Dequeue the front untried move, apply it, and append the resulting child.
    ///
    /// `size` is maintained incrementally: the new child starts at size 1 and every node from
    /// its parent up to the root gains 1 (§4.4, §9 "incremental" decision).
    pub fn expand(self: &Rc<Self>) -> Result<Rc<Self>> {
        debug_assert!(
            !self.terminal && !self.is_fully_expanded(),
            "expand() called on a terminal or fully expanded node"
        );
        let mv = self
            .untried_actions
            .borrow_mut()
            .pop_front()
            .expect("expand() precondition: untried_actions is non-empty");
        let child_state = self.state.apply(&mv).ok_or(EngineError::IllegalTransition)?;
        let child = Node::new_child(self, child_state, mv);
        self.children.borrow_mut().push(Rc::clone(&child));

        let mut cursor = Rc::clone(self);
        loop {
            cursor.size.set(cursor.size.get() + 1);
            let next = cursor.parent();
            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(child)
    }

    /// Produce `k` independent simulation scores from this node's state and return their sum.
    pub fn rollout_batch(&self, k: usize) -> Result<f64> {
        if self.terminal {
            return Ok(self.state.rollout());
        }
        rollout::rollout_batch(&self.state, k)
    }

    /// Add `n` to `visits` and `reward_sum` to `score` on self, then on every ancestor.
    /// Orientation is not flipped per level — `select_best_child` does that at read time (§9).
    pub fn backpropagate(self: &Rc<Self>, reward_sum: f64, n: u64) {
        let mut cursor = Rc::clone(self);
        loop {
            cursor.visits.set(cursor.visits.get() + n);
            cursor.score.set(cursor.score.get() + reward_sum);
            let next = cursor.parent();
            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }
    }

    fn winrate_from_self_side(&self) -> f64 {
        let visits = self.visits.get();
        if visits == 0 {
            return 0.0;
        }
        self.score.get() / visits as f64
    }

    /// Child maximizing UCT. A child with zero visits is selected immediately. Ties broken by
    /// lowest index.
    pub fn select_best_child(&self, exploration_constant: f64) -> Option<Rc<Self>> {
        let children = self.children.borrow();
        if children.is_empty() {
            return None;
        }
        if let Some(unvisited) = children.iter().find(|c| c.visits() == 0) {
            return Some(Rc::clone(unvisited));
        }

        let parent_visits = self.visits.get().max(1) as f64;
        let self_moves = self.state.self_side_turn();

        children
            .iter()
            .max_by(|a, b| {
                uct_score(a, self_moves, parent_visits, exploration_constant)
                    .partial_cmp(&uct_score(b, self_moves, parent_visits, exploration_constant))
                    .expect("UCT scores are never NaN for visited nodes")
            })
            .cloned()
    }
}

fn uct_score<G: GameState>(
    node: &Rc<Node<G>>,
    self_moves_at_parent: bool,
    parent_visits: f64,
    exploration_constant: f64,
) -> f64 {
    let raw_winrate = node.winrate_from_self_side();
    let winrate = if self_moves_at_parent {
        raw_winrate
    } else {
        1.0 - raw_winrate
    };
    let visits = node.visits.get() as f64;
    winrate + exploration_constant * (parent_visits.ln() / visits).sqrt()
}
