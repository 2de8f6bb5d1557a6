//! Per-search statistics
//!
//! [`SearchStatistics`] is reset at the start of every search and filled in
//! when its budget runs out.

use std::time::Duration;

/// What one search did and how long it took
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Iterations completed
    pub iterations: usize,

    /// State copies and action applications made by this search
    pub forward_model_calls: u64,

    /// Wall-clock time of the search
    pub total_time: Duration,

    /// Nodes across every tree (or the graph) after the search
    pub tree_size: usize,

    /// Number of trees held: one per acting player for multi-tree search,
    /// otherwise one
    pub trees: usize,

    /// Entries in the OMA or transposition side table, 0 for topologies
    /// without one
    pub side_table_entries: usize,

    /// Deepest node the searching player's tree reached
    pub max_depth: usize,

    /// Whether a time budget ended the search before it was used up
    pub stopped_early: bool,
}

impl SearchStatistics {
    /// Empty statistics for a search that has not started
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean iteration time in microseconds
    pub fn avg_time_per_iteration_us(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_time.as_micros() as f64 / self.iterations as f64
    }

    /// Iterations completed per second of search
    pub fn iterations_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / secs
    }

    /// Mean forward-model calls per iteration
    pub fn calls_per_iteration(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.forward_model_calls as f64 / self.iterations as f64
    }

    /// Multi-line report for logs
    pub fn summary(&self) -> String {
        format!(
            "MCTS Search Statistics:\n\
             - Iterations: {} ({:.1}/s, {:.3} µs each)\n\
             - Forward model calls: {} ({:.1} per iteration)\n\
             - Total time: {:.3} seconds{}\n\
             - Trees: {} holding {} nodes, max depth {}\n\
             - Side table entries: {}",
            self.iterations,
            self.iterations_per_second(),
            self.avg_time_per_iteration_us(),
            self.forward_model_calls,
            self.calls_per_iteration(),
            self.total_time.as_secs_f64(),
            if self.stopped_early {
                " (stopped early)"
            } else {
                ""
            },
            self.trees,
            self.tree_size,
            self.max_depth,
            self.side_table_entries
        )
    }
}
