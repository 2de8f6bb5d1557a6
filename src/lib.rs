//! # multiplayer-mcts
//!
//! A game-agnostic Monte Carlo Tree Search (MCTS) engine for turn-based games
//! with any number of players.
//!
//! The engine only sees a game through the [`GameState`] forward model: a
//! copyable state that reports who acts, lists legal actions, applies them
//! and scores the result for each player. Everything else is configuration.
//!
//! ## Features
//!
//! - Selection policies: UCB1, UCB1-Tuned, EXP3, regret matching, Hedge and
//!   AlphaGo-style prior-weighted UCB
//! - Rollout policies: uniform random, MAST and epsilon-greedy heuristic
//! - Opponent models: one shared tree (optionally paranoid), self-only trees,
//!   one tree per player, Opponent Move Abstraction and transposition graphs
//! - Iteration, forward-model-call and wall-clock budgets
//! - Perfect-information Monte Carlo over sampled determinizations
//! - Tree reuse between successive decisions, search statistics and
//!   visualization
//!
//! ## Basic Usage
//!
//! ```
//! use multiplayer_mcts::{Action, ForwardModelError, GameState, MCTSConfig, MCTS};
//!
//! // Each player adds 1 or 2 to a running total; reaching 10 wins.
//! #[derive(Clone, Debug, PartialEq, Eq, Hash)]
//! struct Add(u8);
//!
//! impl Action for Add {
//!     fn id(&self) -> usize { self.0 as usize }
//! }
//!
//! #[derive(Clone)]
//! struct Race {
//!     total: u8,
//!     to_move: usize,
//!     winner: Option<usize>,
//! }
//!
//! impl GameState for Race {
//!     type Action = Add;
//!
//!     fn num_players(&self) -> usize { 2 }
//!
//!     fn current_player(&self) -> usize { self.to_move }
//!
//!     fn is_terminal(&self) -> bool { self.winner.is_some() }
//!
//!     fn legal_actions(&self) -> Vec<Add> {
//!         if self.is_terminal() { vec![] } else { vec![Add(1), Add(2)] }
//!     }
//!
//!     fn apply_action(&mut self, action: &Add) -> Result<(), ForwardModelError> {
//!         self.total += action.0;
//!         if self.total >= 10 {
//!             self.winner = Some(self.to_move);
//!         }
//!         self.to_move = 1 - self.to_move;
//!         Ok(())
//!     }
//!
//!     fn score(&self, player: usize) -> f64 {
//!         match self.winner {
//!             Some(w) if w == player => 1.0,
//!             Some(_) => 0.0,
//!             None => 0.5,
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), multiplayer_mcts::MCTSError> {
//!     let state = Race { total: 8, to_move: 0, winner: None };
//!     let config = MCTSConfig::default()
//!         .with_max_iterations(200)
//!         .with_seed(7);
//!
//!     let mut mcts = MCTS::new(state, config)?;
//!     let action = mcts.search()?;
//!
//!     println!("{}", mcts.get_statistics().summary());
//!     assert_eq!(action, Add(2));
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Each iteration copies the root state and then:
//!
//! 1. **Selection**: descends the tree, choosing among the legal actions of
//!    each node with the selection policy of the player acting there.
//! 2. **Expansion**: adds one node per tree for an action not tried before.
//! 3. **Rollout**: plays the rollout policy for up to `rollout_length`
//!    moves and scores the final state for every player.
//! 4. **Backup**: adds the outcome vector to the statistics of every edge on
//!    the path, and to any topology-specific side tables.
//!
//! Nodes store no game state. Every iteration replays its actions from the
//! root, so the legal actions of a node may differ between visits and
//! selection only considers the ones currently legal.
//!
//! ## Hidden information
//!
//! [`PerfectInformationSearch`] runs one search per sampled world (from
//! [`GameState::determinize`]) and combines them:
//!
//! ```
//! # use multiplayer_mcts::{Action, ForwardModelError, GameState};
//! use multiplayer_mcts::{Aggregation, MCTSConfig, PerfectInformationSearch};
//! # #[derive(Clone)]
//! # struct Pick(bool);
//! # impl GameState for Pick {
//! #     type Action = usize;
//! #     fn num_players(&self) -> usize { 1 }
//! #     fn current_player(&self) -> usize { 0 }
//! #     fn is_terminal(&self) -> bool { self.0 }
//! #     fn legal_actions(&self) -> Vec<usize> { if self.0 { vec![] } else { vec![0, 1] } }
//! #     fn apply_action(&mut self, _: &usize) -> Result<(), ForwardModelError> { self.0 = true; Ok(()) }
//! #     fn score(&self, _: usize) -> f64 { 1.0 }
//! # }
//!
//! let search = PerfectInformationSearch::new(MCTSConfig::default().with_max_iterations(50).with_seed(1), 4)
//!     .with_aggregation(Aggregation::TotalVisits);
//! let action = search.search(&Pick(false)).unwrap();
//! assert!(action < 2);
//! ```

pub mod config;
pub mod determinization;
pub mod game_state;
pub mod mcts;
pub mod oma;
pub mod policy;
pub mod stats;
pub mod transposition;
pub mod tree;
pub mod utils;

pub use config::MCTSConfig;
pub use determinization::{Aggregation, PerfectInformationSearch, RootSummary};
pub use game_state::{Action, ForwardModelError, GameState};
pub use mcts::MCTS;
pub use policy::{RolloutPolicy, SelectionPolicy};
pub use stats::SearchStatistics;
pub use tree::{MCTSNode, NodeId, SearchTree};

/// Error types for the MCTS algorithm
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MCTSError {
    /// No legal actions are available from the current state
    #[error("No legal actions available from current state")]
    NoLegalActions,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The forward model failed to apply an action
    #[error(transparent)]
    ForwardModel(#[from] ForwardModelError),

    /// Graph search needs feature vectors the game does not provide
    #[error("Graph search requires GameState::feature_vector for every state")]
    MissingFeatureVector,
}

/// Result type for MCTS operations
pub type Result<T> = std::result::Result<T, MCTSError>;
