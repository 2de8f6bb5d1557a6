//! Policies for different phases of the MCTS algorithm
//!
//! - Selection policies: how to choose which edge to descend in the tree
//! - Simulation policies: how to play moves beyond the tree frontier
//!
//! The final recommendation is chosen by
//! [`BestChildCriteria`](crate::config::BestChildCriteria).

pub mod selection;
pub mod simulation;

pub use selection::{SelectionContext, SelectionPolicy};
pub use simulation::{MastStats, MastTable, RolloutPolicy};
