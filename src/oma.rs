//! Opponent Move Abstraction side tables
//!
//! For a node where player `p` acts, the OMA parent is the nearest ancestor
//! where `p` acted before. The table records, for each OMA parent and each
//! action `p` took there, how `p`'s next own actions did, regardless of what
//! the opponents did in between.

use std::collections::HashMap;

use crate::{game_state::Action, tree::NodeId};

/// Visit count and total value of one own action under one OMA context
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OmaStats {
    /// Number of backups
    pub visits: u64,

    /// Sum of the acting player's backed-up values
    pub total_value: f64,
}

impl OmaStats {
    /// Mean value, `None` if never visited
    pub fn mean(&self) -> Option<f64> {
        if self.visits == 0 {
            None
        } else {
            Some(self.total_value / self.visits as f64)
        }
    }
}

/// OMA parent -> action at the OMA parent -> own subsequent action -> stats
#[derive(Debug, Clone)]
pub struct OmaTable<A: Action> {
    tables: HashMap<NodeId, HashMap<A, HashMap<A, OmaStats>>>,
}

impl<A: Action> Default for OmaTable<A> {
    fn default() -> Self {
        OmaTable {
            tables: HashMap::new(),
        }
    }
}

impl<A: Action> OmaTable<A> {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics for `own_action` after `parent_action` was taken at `oma_parent`
    pub fn get(&self, oma_parent: NodeId, parent_action: &A, own_action: &A) -> Option<&OmaStats> {
        self.tables
            .get(&oma_parent)
            .and_then(|by_parent| by_parent.get(parent_action))
            .and_then(|by_own| by_own.get(own_action))
    }

    /// Records one backed-up value
    pub fn update(&mut self, oma_parent: NodeId, parent_action: &A, own_action: &A, value: f64) {
        let stats = self
            .tables
            .entry(oma_parent)
            .or_default()
            .entry(parent_action.clone())
            .or_default()
            .entry(own_action.clone())
            .or_default();
        stats.visits += 1;
        stats.total_value += value;
    }

    /// Number of OMA parents with recorded statistics
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
