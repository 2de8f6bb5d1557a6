//! Simulation (rollout) policies for the MCTS algorithm
//!
//! A rollout policy picks moves beyond the tree frontier, and for opponents
//! whose decisions are not part of the tree. MAST keeps cross-iteration
//! statistics per player keyed by [`Action::mast_key`](crate::Action::mast_key).

use std::collections::HashMap;

use rand::Rng;

use crate::{
    config::MCTSConfig,
    game_state::{Action, GameState},
    utils, Result,
};

/// Default policies used beyond the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloutPolicy {
    /// Uniformly random legal moves
    Random,

    /// Move-Average Sampling: Boltzmann over the player's MAST means,
    /// with `mast_epsilon` uniformly random moves
    Mast,

    /// One-step greedy on the game's heuristic, with `epsilon` random moves
    ///
    /// Every candidate costs one state copy and one action application.
    Heuristic {
        /// Probability of a uniformly random move
        epsilon: f64,
    },
}

/// Running statistics for one MAST key
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MastStats {
    /// Number of updates, fractional once decayed
    pub visits: f64,

    /// Sum of backed-up values
    pub total_value: f64,
}

impl MastStats {
    /// Mean value, `None` if never visited
    pub fn mean(&self) -> Option<f64> {
        if self.visits > 0.0 {
            Some(self.total_value / self.visits)
        } else {
            None
        }
    }
}

/// Per-player action statistics shared by every iteration of a search
#[derive(Debug, Clone, Default)]
pub struct MastTable {
    players: Vec<HashMap<usize, MastStats>>,
}

impl MastTable {
    /// Creates empty tables for `num_players` players
    pub fn new(num_players: usize) -> Self {
        MastTable {
            players: vec![HashMap::new(); num_players],
        }
    }

    /// Records one outcome for an action taken by `player`
    pub fn update(&mut self, player: usize, key: usize, value: f64) {
        let entry = self.players[player].entry(key).or_default();
        entry.visits += 1.0;
        entry.total_value += value;
    }

    /// Statistics for an action of `player`
    pub fn get(&self, player: usize, key: usize) -> Option<&MastStats> {
        self.players.get(player).and_then(|table| table.get(&key))
    }

    /// Scales all statistics by `gamma`, clearing them when `gamma` is zero
    pub fn decay(&mut self, gamma: f64) {
        for table in &mut self.players {
            if gamma <= 0.0 {
                table.clear();
                continue;
            }
            for stats in table.values_mut() {
                stats.visits *= gamma;
                stats.total_value *= gamma;
            }
        }
    }

    /// Number of keys recorded for `player`
    pub fn len(&self, player: usize) -> usize {
        self.players.get(player).map_or(0, HashMap::len)
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.players.iter().all(HashMap::is_empty)
    }
}

impl RolloutPolicy {
    /// Picks one of `actions` for the player to move in `state`
    ///
    /// Returns the index of the chosen action. `forward_model_calls` is
    /// incremented for every state copy and action application made while
    /// choosing.
    pub fn choose<S: GameState, R: Rng + ?Sized>(
        &self,
        state: &S,
        actions: &[S::Action],
        mast: &MastTable,
        config: &MCTSConfig,
        forward_model_calls: &mut u64,
        rng: &mut R,
    ) -> Result<usize> {
        if actions.len() == 1 {
            return Ok(0);
        }
        match self {
            RolloutPolicy::Random => Ok(rng.gen_range(0..actions.len())),

            RolloutPolicy::Mast => {
                if rng.gen::<f64>() < config.mast_epsilon {
                    return Ok(rng.gen_range(0..actions.len()));
                }
                let player = state.current_player();
                let values: Vec<f64> = actions
                    .iter()
                    .map(|a| {
                        mast.get(player, a.mast_key())
                            .and_then(MastStats::mean)
                            .unwrap_or(config.mast_default_value)
                    })
                    .collect();
                let probabilities = utils::boltzmann(&values, config.mast_boltzmann);
                Ok(utils::sample_index(&probabilities, rng))
            }

            RolloutPolicy::Heuristic { epsilon } => {
                if rng.gen::<f64>() < *epsilon {
                    return Ok(rng.gen_range(0..actions.len()));
                }
                let player = state.current_player();
                let mut scores = Vec::with_capacity(actions.len());
                for action in actions {
                    let mut next = state.clone();
                    next.apply_action(action)?;
                    *forward_model_calls += 2;
                    let value = if next.is_terminal() {
                        next.score(player)
                    } else {
                        next.heuristic(player)
                    };
                    scores.push(utils::noise(value, config.epsilon, rng));
                }
                Ok(utils::argmax(&scores).unwrap_or(0))
            }
        }
    }
}
