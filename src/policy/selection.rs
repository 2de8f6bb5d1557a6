//! Selection policies for the MCTS algorithm
//!
//! Selection policies decide which already-expanded edge to descend during
//! the tree phase. The UCB family takes an argmax over a score; EXP3, Hedge
//! and regret matching sample from a distribution, since they assume
//! stochastic adversaries.

use rand::Rng;

use crate::{
    config::MCTSConfig,
    tree::{Edge, MCTSNode},
    utils,
};

/// Pluggable tree policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Upper Confidence Bound 1
    ///
    /// ```text
    /// UCB1 = Q + K * sqrt(ln(N + 1) / (n + epsilon))
    /// ```
    Ucb,

    /// UCB1 with the exploration term bounded by the empirical variance
    Ucb1Tuned,

    /// EXP3: importance-weighted cumulative gains through a softmax
    Exp3,

    /// Regret matching on importance-weighted cumulative regrets
    RegretMatching,

    /// Hedge: softmax over mean values with temperature `boltzmann`
    Hedge,

    /// AlphaGo-style UCB weighted by the game's action priors
    ///
    /// ```text
    /// score = Q + K * P(a) * sqrt(N) / (1 + n)
    /// ```
    AlphaGo,
}

/// What a selection policy needs to know besides the node itself
pub struct SelectionContext<'a> {
    /// Search configuration
    pub config: &'a MCTSConfig,

    /// Lowest and highest outcome backed up so far
    pub bounds: (f64, f64),

    /// OMA mean value per candidate, parallel to the candidate list
    pub oma_values: Option<&'a [Option<f64>]>,
}

impl SelectionContext<'_> {
    fn normalise(&self, value: f64) -> f64 {
        if self.config.normalise_rewards {
            utils::normalise(value, self.bounds.0, self.bounds.1)
        } else {
            value
        }
    }

    /// Exploitation term of a candidate, blended with OMA statistics if present
    fn exploitation<A: crate::Action>(&self, edge: &Edge<A>, player: usize, slot: usize) -> f64 {
        let own = self.normalise(edge.stats.mean(player));
        match self.oma_values.and_then(|values| values[slot]) {
            Some(oma) => {
                let w = self.config.oma_weight;
                (1.0 - w) * own + w * self.normalise(oma)
            }
            None => own,
        }
    }
}

impl SelectionPolicy {
    /// Returns true for policies that sample and need bandit updates on backup
    pub fn is_stochastic(&self) -> bool {
        matches!(
            self,
            SelectionPolicy::Exp3 | SelectionPolicy::RegretMatching | SelectionPolicy::Hedge
        )
    }

    /// Selects one of `candidates` (edge indices of `node`)
    ///
    /// Returns the chosen edge index and the probability it was chosen with
    /// (1.0 for deterministic policies). The player to move at `node`
    /// maximises their own entry of the value vector.
    pub fn select<A: crate::Action, R: Rng + ?Sized>(
        &self,
        node: &MCTSNode<A>,
        candidates: &[usize],
        ctx: &SelectionContext<'_>,
        rng: &mut R,
    ) -> (usize, f64) {
        debug_assert!(!candidates.is_empty());
        let player = node.decision_player;
        let config = ctx.config;
        let k = config.exploration_constant;
        let parent_visits = node.visits;

        let edges = candidates.iter().map(|&i| &node.edges[i]);

        match self {
            SelectionPolicy::Ucb => {
                let scores: Vec<f64> = edges
                    .enumerate()
                    .map(|(slot, edge)| {
                        let q = ctx.exploitation(edge, player, slot);
                        let u = utils::exploration_term(parent_visits, edge.stats.visits, config.epsilon);
                        utils::noise(q + k * u, config.epsilon, rng)
                    })
                    .collect();
                (pick_max(candidates, &scores), 1.0)
            }

            SelectionPolicy::Ucb1Tuned => {
                let range = if config.normalise_rewards && ctx.bounds.1 > ctx.bounds.0 {
                    ctx.bounds.1 - ctx.bounds.0
                } else {
                    1.0
                };
                let ln_n = ((parent_visits + 1) as f64).ln();
                let scores: Vec<f64> = edges
                    .enumerate()
                    .map(|(slot, edge)| {
                        let q = ctx.exploitation(edge, player, slot);
                        let n = edge.stats.visits as f64 + config.epsilon;
                        let variance = edge.stats.variance(player) / (range * range);
                        let bound = (variance + (2.0 * ln_n / n).sqrt()).min(0.25);
                        let u = (ln_n / n * bound).sqrt();
                        utils::noise(q + k * u, config.epsilon, rng)
                    })
                    .collect();
                (pick_max(candidates, &scores), 1.0)
            }

            SelectionPolicy::AlphaGo => {
                let total_prior: f64 = candidates.iter().map(|&i| node.edges[i].prior).sum();
                let uniform = 1.0 / candidates.len() as f64;
                let sqrt_n = (parent_visits as f64).sqrt();
                let scores: Vec<f64> = edges
                    .enumerate()
                    .map(|(slot, edge)| {
                        let q = ctx.exploitation(edge, player, slot);
                        let p = if total_prior > 0.0 {
                            edge.prior / total_prior
                        } else {
                            uniform
                        };
                        let u = p * sqrt_n / (1.0 + edge.stats.visits as f64);
                        utils::noise(q + k * u, config.epsilon, rng)
                    })
                    .collect();
                (pick_max(candidates, &scores), 1.0)
            }

            SelectionPolicy::Hedge => {
                let values: Vec<f64> = edges
                    .enumerate()
                    .map(|(slot, edge)| ctx.exploitation(edge, player, slot))
                    .collect();
                let probabilities = utils::boltzmann(&values, config.boltzmann);
                sample(candidates, &probabilities, rng)
            }

            SelectionPolicy::Exp3 => {
                let probabilities = self.distribution(node, candidates, config);
                sample(candidates, &probabilities, rng)
            }

            SelectionPolicy::RegretMatching => {
                let probabilities = self.distribution(node, candidates, config);
                sample(candidates, &probabilities, rng)
            }
        }
    }

    /// The current sampling distribution of EXP3 or regret matching
    ///
    /// Returns a uniform distribution for the other policies.
    pub fn distribution<A: crate::Action>(
        &self,
        node: &MCTSNode<A>,
        candidates: &[usize],
        config: &MCTSConfig,
    ) -> Vec<f64> {
        let k = candidates.len() as f64;
        let gamma = config.gamma;
        let uniform = vec![1.0 / k; candidates.len()];
        match self {
            SelectionPolicy::Exp3 => {
                let eta = if gamma > 0.0 { gamma / k } else { 1.0 / k };
                let gains: Vec<f64> = candidates.iter().map(|&i| node.edges[i].bandit).collect();
                utils::boltzmann(&gains, 1.0 / eta)
                    .into_iter()
                    .map(|p| (1.0 - gamma) * p + gamma / k)
                    .collect()
            }
            SelectionPolicy::RegretMatching => {
                let positive: Vec<f64> = candidates
                    .iter()
                    .map(|&i| node.edges[i].bandit.max(0.0))
                    .collect();
                let total: f64 = positive.iter().sum();
                if total <= 0.0 {
                    return uniform;
                }
                positive
                    .into_iter()
                    .map(|r| (1.0 - gamma) * r / total + gamma / k)
                    .collect()
            }
            _ => uniform,
        }
    }

    /// Updates the bandit state of `node` after a backup
    ///
    /// `chosen` was selected with `probability`; `reward` is the decision
    /// player's outcome rescaled to `[0, 1]`.
    pub fn update<A: crate::Action>(
        &self,
        node: &mut MCTSNode<A>,
        chosen: usize,
        probability: f64,
        reward: f64,
    ) {
        let estimate = reward / probability.max(f64::MIN_POSITIVE);
        match self {
            SelectionPolicy::Exp3 => node.edges[chosen].bandit += estimate,
            SelectionPolicy::RegretMatching => {
                for (i, edge) in node.edges.iter_mut().enumerate() {
                    let gain = if i == chosen { estimate } else { 0.0 };
                    edge.bandit += gain - reward;
                }
            }
            _ => {}
        }
    }
}

fn pick_max(candidates: &[usize], scores: &[f64]) -> usize {
    utils::argmax(scores).map_or(candidates[0], |i| candidates[i])
}

fn sample<R: Rng + ?Sized>(candidates: &[usize], probabilities: &[f64], rng: &mut R) -> (usize, f64) {
    let slot = utils::sample_index(probabilities, rng);
    (candidates[slot], probabilities[slot])
}
