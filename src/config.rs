//! Configuration options for the MCTS algorithm
//!
//! This module defines the configuration parameters that control the
//! behaviour of a search, and the validation that rejects incompatible
//! combinations before any iteration runs.

use std::time::Duration;

use crate::{
    policy::{selection::SelectionPolicy, simulation::RolloutPolicy},
    MCTSError, Result,
};

/// Criteria for selecting the best child after search is complete
///
/// This determines how the final action is selected after the search budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestChildCriteria {
    /// Select the child with the most visits
    ///
    /// Ties are broken by mean value, then randomly. This is the robust
    /// choice and the default.
    MostVisits,

    /// Select the child with the highest mean value
    ///
    /// More aggressive: favours high-value moves even if they have been
    /// visited less often.
    HighestValue,
}

/// How opponents' decisions are represented in the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentTreePolicy {
    /// A tree of the searching player's decisions only
    ///
    /// Opponent moves are played by the rollout policy and treated as
    /// stochastic transitions between the searching player's nodes.
    SelfOnly,

    /// One tree shared by all players
    ///
    /// Every player maximises their own entry in the outcome vector, or
    /// minimises the searching player's when [`MCTSConfig::paranoid`] is set.
    OneTree,

    /// One independent tree per player, rooted the first time that player acts
    MultiTree,

    /// A shared tree plus Opponent Move Abstraction side tables
    Oma,

    /// Graph search where states with equal feature vectors share a node
    Mcgs,
}

/// The stopping condition of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Stop after this many iterations
    Iterations(usize),

    /// Stop once this many forward-model calls (state copies and action
    /// applications) have been made
    ForwardModelCalls(usize),

    /// Stop before the next iteration would overrun this wall-clock budget
    Time(Duration),
}

/// Configuration for the MCTS algorithm
///
/// This struct contains all parameters that control the behaviour of the search.
/// Use the builder methods to create a customised configuration.
///
/// # Example
///
/// ```
/// use multiplayer_mcts::{MCTSConfig, config::{BestChildCriteria, Budget, OpponentTreePolicy}};
/// use std::time::Duration;
///
/// let config = MCTSConfig::default()
///     .with_exploration_constant(1.5)
///     .with_budget(Budget::Time(Duration::from_millis(50)))
///     .with_opponent_tree_policy(OpponentTreePolicy::OneTree)
///     .with_paranoid(true)
///     .with_best_child_criteria(BestChildCriteria::MostVisits);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MCTSConfig {
    /// Exploration constant `K` used by the UCB family of selection policies
    pub exploration_constant: f64,

    /// When to stop searching
    pub budget: Budget,

    /// Maximum depth of a tree node below the root
    ///
    /// Once a descent reaches this depth the rollout begins even when the
    /// state is not terminal.
    pub max_tree_depth: usize,

    /// Maximum number of rollout moves after the tree has been left
    ///
    /// Zero disables rollouts: the heuristic value of the frontier state is
    /// backed up directly.
    pub rollout_length: usize,

    /// Policy used to descend the tree
    pub selection_policy: SelectionPolicy,

    /// Policy used beyond the tree frontier
    pub rollout_policy: RolloutPolicy,

    /// Shape of the search tree with respect to opponents
    pub opponent_tree_policy: OpponentTreePolicy,

    /// Treat every other player as minimising the searching player's value
    pub paranoid: bool,

    /// Criteria for selecting the action to play once the search stops
    pub best_child_criteria: BestChildCriteria,

    /// Rescale backed-up values to `[0, 1]` using the bounds seen so far
    pub normalise_rewards: bool,

    /// Magnitude of the random perturbation used to break ties
    pub epsilon: f64,

    /// Weight of OMA statistics relative to the node's own statistics
    pub oma_weight: f64,

    /// Boltzmann temperature for MAST rollouts
    pub mast_boltzmann: f64,

    /// Probability of a uniformly random MAST rollout move
    pub mast_epsilon: f64,

    /// Value assumed for actions MAST has never seen
    pub mast_default_value: f64,

    /// Decay applied to MAST statistics between successive searches
    ///
    /// Zero clears the tables at the start of every search.
    pub mast_gamma: f64,

    /// Uniform exploration mixed into EXP3 and regret-matching distributions
    pub gamma: f64,

    /// Temperature of the Hedge distribution
    pub boltzmann: f64,

    /// Time left unused at the end of a time budget
    pub time_safety_margin: Duration,

    /// Bucket width used to discretise feature vectors for graph search
    pub mcgs_resolution: f64,

    /// Keep the subtree below the actions actually played between searches
    pub reuse_tree: bool,

    /// Seed for the search's random number generator
    ///
    /// With a seed and a non-time budget the search is fully reproducible.
    pub seed: Option<u64>,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        MCTSConfig {
            exploration_constant: 1.414, // sqrt(2)
            budget: Budget::Iterations(10_000),
            max_tree_depth: 100,
            rollout_length: 10,
            selection_policy: SelectionPolicy::Ucb,
            rollout_policy: RolloutPolicy::Random,
            opponent_tree_policy: OpponentTreePolicy::OneTree,
            paranoid: false,
            best_child_criteria: BestChildCriteria::MostVisits,
            normalise_rewards: true,
            epsilon: 1e-6,
            oma_weight: 0.5,
            mast_boltzmann: 0.1,
            mast_epsilon: 0.0,
            mast_default_value: 0.0,
            mast_gamma: 0.0,
            gamma: 0.1,
            boltzmann: 0.1,
            time_safety_margin: Duration::from_millis(2),
            mcgs_resolution: 1.0,
            reuse_tree: false,
            seed: None,
        }
    }
}

impl MCTSConfig {
    /// Sets the exploration constant
    pub fn with_exploration_constant(mut self, constant: f64) -> Self {
        self.exploration_constant = constant;
        self
    }

    /// Sets the budget
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets an iteration budget
    pub fn with_max_iterations(self, iterations: usize) -> Self {
        self.with_budget(Budget::Iterations(iterations))
    }

    /// Sets a wall-clock budget
    pub fn with_max_time(self, duration: Duration) -> Self {
        self.with_budget(Budget::Time(duration))
    }

    /// Sets the maximum tree depth
    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth;
        self
    }

    /// Sets the rollout length (zero disables rollouts)
    pub fn with_rollout_length(mut self, length: usize) -> Self {
        self.rollout_length = length;
        self
    }

    /// Sets the selection policy
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Sets the rollout policy
    pub fn with_rollout_policy(mut self, policy: RolloutPolicy) -> Self {
        self.rollout_policy = policy;
        self
    }

    /// Sets the opponent tree policy
    pub fn with_opponent_tree_policy(mut self, policy: OpponentTreePolicy) -> Self {
        self.opponent_tree_policy = policy;
        self
    }

    /// Sets whether opponents are modelled as paranoid minimisers
    pub fn with_paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    /// Sets the criteria for selecting the best child
    pub fn with_best_child_criteria(mut self, criteria: BestChildCriteria) -> Self {
        self.best_child_criteria = criteria;
        self
    }

    /// Sets whether rewards are normalised before selection
    pub fn with_normalise_rewards(mut self, normalise: bool) -> Self {
        self.normalise_rewards = normalise;
        self
    }

    /// Sets the tie-break noise magnitude
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the OMA blending weight
    pub fn with_oma_weight(mut self, weight: f64) -> Self {
        self.oma_weight = weight;
        self
    }

    /// Sets the MAST parameters
    pub fn with_mast(mut self, boltzmann: f64, epsilon: f64, default_value: f64) -> Self {
        self.mast_boltzmann = boltzmann;
        self.mast_epsilon = epsilon;
        self.mast_default_value = default_value;
        self
    }

    /// Sets the MAST decay between searches
    pub fn with_mast_gamma(mut self, gamma: f64) -> Self {
        self.mast_gamma = gamma;
        self
    }

    /// Sets the EXP3 / regret-matching exploration mix
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the Hedge temperature
    pub fn with_boltzmann(mut self, temperature: f64) -> Self {
        self.boltzmann = temperature;
        self
    }

    /// Sets the safety margin kept free at the end of a time budget
    pub fn with_time_safety_margin(mut self, margin: Duration) -> Self {
        self.time_safety_margin = margin;
        self
    }

    /// Sets the feature-vector bucket width used by graph search
    pub fn with_mcgs_resolution(mut self, resolution: f64) -> Self {
        self.mcgs_resolution = resolution;
        self
    }

    /// Sets whether the tree is kept between successive searches
    pub fn with_reuse_tree(mut self, reuse: bool) -> Self {
        self.reuse_tree = reuse;
        self
    }

    /// Sets the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that the settings can be used together
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(MCTSError::InvalidConfiguration(msg.to_string()));

        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return invalid("exploration constant must be finite and non-negative");
        }
        if self.paranoid
            && matches!(
                self.opponent_tree_policy,
                OpponentTreePolicy::SelfOnly | OpponentTreePolicy::MultiTree
            )
        {
            return invalid("paranoid backup needs a tree that contains opponent decisions");
        }
        if self.reuse_tree
            && !matches!(
                self.opponent_tree_policy,
                OpponentTreePolicy::SelfOnly | OpponentTreePolicy::OneTree
            )
        {
            return invalid("tree reuse is only supported for self-only and one-tree searches");
        }
        if self.mast_boltzmann <= 0.0 || self.boltzmann <= 0.0 {
            return invalid("temperatures must be positive");
        }
        for (name, value) in [
            ("gamma", self.gamma),
            ("mast_epsilon", self.mast_epsilon),
            ("mast_gamma", self.mast_gamma),
            ("oma_weight", self.oma_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MCTSError::InvalidConfiguration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !(0.0..1.0).contains(&self.epsilon) {
            return invalid("epsilon must lie in [0, 1)");
        }
        if self.mcgs_resolution <= 0.0 {
            return invalid("mcgs_resolution must be positive");
        }
        if let RolloutPolicy::Heuristic { epsilon } = self.rollout_policy {
            if !(0.0..=1.0).contains(&epsilon) {
                return invalid("heuristic rollout epsilon must lie in [0, 1]");
            }
        }
        Ok(())
    }
}
