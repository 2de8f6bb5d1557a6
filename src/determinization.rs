//! Perfect-information Monte Carlo search for hidden-information games
//!
//! [`PerfectInformationSearch`] samples several fully specified worlds
//! consistent with what the acting player can observe, runs an independent
//! search in each, and combines the root statistics into one decision.

use log::info;
use rand::{seq::SliceRandom, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::{utils, Action, GameState, MCTSConfig, MCTSError, Result, MCTS};

/// Statistics of one root action after a search
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSummary<A> {
    /// The root action
    pub action: A,
    /// Backups through this action at the root
    pub visits: u64,
    /// Sum of the searching player's backed-up values
    pub total_value: f64,
}

/// Root statistics of one finished search
#[derive(Debug, Clone, PartialEq)]
pub struct RootSummary<A> {
    /// The action the search recommended, if any root action was visited
    pub best: Option<A>,
    /// Every action the root has an edge for
    pub actions: Vec<ActionSummary<A>>,
}

impl<A: PartialEq> RootSummary<A> {
    /// Statistics of `action`, if the search saw it at the root
    pub fn action(&self, action: &A) -> Option<&ActionSummary<A>> {
        self.actions.iter().find(|s| &s.action == action)
    }
}

/// How per-determinization results are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Each determinization votes for its recommended action
    #[default]
    SingleVote,

    /// Highest summed total value
    TotalValue,

    /// Highest summed visit count
    TotalVisits,

    /// Highest summed total value divided by summed visits
    AverageValue,
}

/// Runs one search per sampled world and aggregates the results
#[derive(Debug, Clone)]
pub struct PerfectInformationSearch {
    config: MCTSConfig,
    determinizations: usize,
    aggregation: Aggregation,
    parallel: bool,
}

impl PerfectInformationSearch {
    /// Creates an aggregator running `determinizations` searches with `config`
    pub fn new(config: MCTSConfig, determinizations: usize) -> Self {
        PerfectInformationSearch {
            config,
            determinizations,
            aggregation: Aggregation::default(),
            parallel: false,
        }
    }

    /// Sets the aggregation method
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Runs the determinizations on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of worlds sampled per decision
    pub fn determinizations(&self) -> usize {
        self.determinizations
    }

    /// How the per-world results are combined
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Searches every determinization of `state` and returns the aggregated decision
    ///
    /// With a configured seed the result is reproducible, whether or not the
    /// searches run in parallel.
    pub fn search<S: GameState>(&self, state: &S) -> Result<S::Action> {
        let legal = state.legal_actions();
        if state.is_terminal() || legal.is_empty() {
            return Err(MCTSError::NoLegalActions);
        }
        let base_seed = self.base_seed();
        let summaries = self.run_determinizations(state, base_seed)?;

        // Worlds use base_seed..base_seed + determinizations.
        let tie_seed = base_seed.wrapping_add(self.determinizations as u64);
        let mut rng = ChaCha20Rng::seed_from_u64(tie_seed);
        let choice = aggregate(
            &summaries,
            &legal,
            self.aggregation,
            self.config.epsilon,
            &mut rng,
        );
        info!(
            "aggregated {} determinizations by {:?}: {:?}",
            summaries.len(),
            self.aggregation,
            choice
        );
        choice.ok_or(MCTSError::NoLegalActions)
    }

    /// Root summaries of every determinization, in determinization order
    pub fn summaries<S: GameState>(&self, state: &S) -> Result<Vec<RootSummary<S::Action>>> {
        self.run_determinizations(state, self.base_seed())
    }

    fn base_seed(&self) -> u64 {
        match self.config.seed {
            Some(seed) => seed,
            None => rand::thread_rng().gen(),
        }
    }

    fn run_determinizations<S: GameState>(
        &self,
        state: &S,
        base_seed: u64,
    ) -> Result<Vec<RootSummary<S::Action>>> {
        if self.determinizations == 0 {
            return Err(MCTSError::InvalidConfiguration(
                "at least one determinization is required".to_string(),
            ));
        }
        self.config.validate()?;
        let observer = state.current_player();

        let run = |i: usize| -> Result<RootSummary<S::Action>> {
            let mut rng = ChaCha20Rng::seed_from_u64(base_seed.wrapping_add(i as u64));
            let world = state.determinize(observer, &mut rng);
            let config = self.config.clone().with_seed(rng.next_u64());
            let mut mcts = MCTS::new(world, config)?;
            mcts.search()?;
            Ok(mcts.root_summary())
        };

        if self.parallel {
            (0..self.determinizations).into_par_iter().map(run).collect()
        } else {
            (0..self.determinizations).map(run).collect()
        }
    }
}

/// Combines root summaries into one of the `legal` actions
///
/// Actions a determinization never saw at its root contribute nothing, and
/// value-based methods never pick an action no determinization visited.
/// Ties are broken by a small random perturbation scaled by `epsilon`; if no
/// legal action was visited at all the choice is uniform. Returns `None`
/// only if `legal` is empty.
pub fn aggregate<A: Action, R: Rng + ?Sized>(
    summaries: &[RootSummary<A>],
    legal: &[A],
    method: Aggregation,
    epsilon: f64,
    rng: &mut R,
) -> Option<A> {
    let totals: Vec<(f64, u64)> = legal
        .iter()
        .map(|action| {
            summaries
                .iter()
                .filter_map(|s| s.action(action))
                .fold((0.0, 0u64), |(v, n), s| (v + s.total_value, n + s.visits))
        })
        .collect();

    if totals.iter().all(|&(_, visits)| visits == 0) {
        return legal.choose(rng).cloned();
    }

    let scores: Vec<f64> = legal
        .iter()
        .zip(&totals)
        .map(|(action, &(value, visits))| {
            let score = match method {
                Aggregation::SingleVote => summaries
                    .iter()
                    .filter(|s| s.best.as_ref() == Some(action))
                    .count() as f64,
                Aggregation::TotalVisits => visits as f64,
                _ if visits == 0 => return f64::NEG_INFINITY,
                Aggregation::TotalValue => value,
                Aggregation::AverageValue => value / visits as f64,
            };
            utils::noise(score, epsilon, rng)
        })
        .collect();

    utils::argmax(&scores).map(|i| legal[i].clone())
}
