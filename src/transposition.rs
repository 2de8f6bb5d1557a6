//! Transposition table for graph search
//!
//! Maps a player-scoped, discretised feature vector to the node that
//! represents every state with that key.

use std::collections::HashMap;

use crate::tree::NodeId;

/// Key -> node map shared by all iterations of one search
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    nodes: HashMap<String, NodeId>,
    resolution: f64,
}

impl TranspositionTable {
    /// Creates an empty table that buckets features by `resolution`
    pub fn new(resolution: f64) -> Self {
        TranspositionTable {
            nodes: HashMap::new(),
            resolution,
        }
    }

    /// Builds the key of a state from the acting player and its features
    ///
    /// ```
    /// use multiplayer_mcts::transposition::TranspositionTable;
    ///
    /// let table = TranspositionTable::new(0.5);
    /// assert_eq!(table.key(1, &[0.9, 2.0]), "1:[2,4]");
    /// assert_eq!(table.key(1, &[1.1, 2.1]), table.key(1, &[0.9, 2.0]));
    /// ```
    pub fn key(&self, player: usize, features: &[f64]) -> String {
        let buckets: Vec<String> = features
            .iter()
            .map(|x| format!("{}", (x / self.resolution).round() as i64))
            .collect();
        format!("{}:[{}]", player, buckets.join(","))
    }

    /// Node registered for `key`
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.nodes.get(key).copied()
    }

    /// Registers the node for `key`
    pub fn insert(&mut self, key: String, node: NodeId) {
        self.nodes.insert(key, node);
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no key is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
