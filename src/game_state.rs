//! Traits defining the forward model consumed by the search.
//!
//! The [`GameState`] trait is the only interface a game has to implement. The
//! search copies states with `Clone`, asks them for legal actions, and applies
//! actions in place on its own copies. The state handed to the search is never
//! mutated.

use std::fmt::Debug;
use std::hash::Hash;

use rand::RngCore;

/// Trait for actions that can be taken in a game
///
/// Actions are used as keys into per-node statistics, so they must be
/// comparable and hashable.
pub trait Action: Clone + Debug + PartialEq + Eq + Hash + Send + Sync {
    /// Returns a unique identifier for this action
    fn id(&self) -> usize;

    /// Returns the key under which MAST rollouts share statistics
    ///
    /// Structurally similar actions (for example "play card X" regardless of
    /// which slot it came from) can map to the same key so that statistics
    /// generalise across states. Defaults to [`Action::id`].
    fn mast_key(&self) -> usize {
        self.id()
    }
}

/// Error reported by a forward model that was asked to apply an impossible action
///
/// This always indicates a bug in the caller or in the game model. The search
/// does not try to recover from it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("forward model rejected action: {0}")]
pub struct ForwardModelError(pub String);

impl ForwardModelError {
    /// Creates a new error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        ForwardModelError(message.into())
    }
}

/// Trait defining the game state interface required for MCTS
///
/// Players are identified by index in `0..num_players()`.
pub trait GameState: Clone + Send + Sync {
    /// The type of actions that can be taken in this game
    type Action: Action;

    /// Returns the number of players taking part
    fn num_players(&self) -> usize;

    /// Returns the player who has to act in this state
    fn current_player(&self) -> usize;

    /// Returns true if this state is terminal (game over)
    fn is_terminal(&self) -> bool;

    /// Returns the list of legal actions in this state
    ///
    /// The order should be stable for a given state, since reproducible
    /// tie-breaking depends on it. Terminal states should return an empty list.
    ///
    /// # Example
    ///
    /// ```
    /// # use multiplayer_mcts::{Action, ForwardModelError, GameState};
    /// # #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    /// # struct MyAction(usize);
    /// # impl Action for MyAction { fn id(&self) -> usize { self.0 } }
    /// # #[derive(Clone)]
    /// # struct MyGame;
    /// # impl GameState for MyGame {
    /// # type Action = MyAction;
    /// # fn num_players(&self) -> usize { 2 }
    /// # fn current_player(&self) -> usize { 0 }
    /// # fn is_terminal(&self) -> bool { false }
    /// fn legal_actions(&self) -> Vec<MyAction> {
    ///     vec![MyAction(0), MyAction(1), MyAction(2)]
    /// }
    /// # fn apply_action(&mut self, _: &MyAction) -> Result<(), ForwardModelError> { Ok(()) }
    /// # fn score(&self, _: usize) -> f64 { 0.5 }
    /// # }
    /// ```
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Applies an action to this state in place
    ///
    /// The forward model may resolve several internal sub-steps before
    /// returning control at the next real decision point. Returning an error
    /// aborts the search.
    fn apply_action(&mut self, action: &Self::Action) -> Result<(), ForwardModelError>;

    /// Returns the score of this state for the given player
    ///
    /// Used as the rollout outcome when the state is terminal.
    fn score(&self, player: usize) -> f64;

    /// Returns a heuristic evaluation of a non-terminal state for the given player
    ///
    /// Used when a rollout is cut short by the rollout-length cap or when
    /// rollouts are disabled. Defaults to [`GameState::score`].
    fn heuristic(&self, player: usize) -> f64 {
        self.score(player)
    }

    /// Returns a feature vector describing this state from a player's point of view
    ///
    /// Only the graph-search topology uses this. States with equal vectors (after
    /// discretisation) are merged into one search node.
    fn feature_vector(&self, _player: usize) -> Option<Vec<f64>> {
        None
    }

    /// Returns an unnormalised prior weight for an action in this state
    ///
    /// Read by the AlphaGo-style selection policy. The weights of all legal
    /// actions at a node are normalised to sum to one.
    fn action_prior(&self, _action: &Self::Action) -> f64 {
        1.0
    }

    /// Samples a fully specified world consistent with what `observer` knows
    ///
    /// The default treats the game as perfect-information and returns a copy.
    fn determinize(&self, _observer: usize, _rng: &mut dyn RngCore) -> Self {
        self.clone()
    }
}

impl Action for usize {
    fn id(&self) -> usize {
        *self
    }
}

impl Action for u8 {
    fn id(&self) -> usize {
        *self as usize
    }
}

impl Action for u32 {
    fn id(&self) -> usize {
        *self as usize
    }
}
