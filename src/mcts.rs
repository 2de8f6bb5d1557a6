//! Main implementation of the Monte Carlo Tree Search algorithm
//!
//! This module owns the iteration loop. Each iteration copies the root
//! state, descends the tree (or trees, or graph) with the selection policy,
//! expands at most one new node per tree, plays the rollout policy beyond the
//! frontier, and backs the outcome vector up to the root.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use rand::{seq::SliceRandom, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{
    config::{Budget, MCTSConfig, OpponentTreePolicy},
    determinization::{ActionSummary, RootSummary},
    game_state::GameState,
    oma::{OmaStats, OmaTable},
    policy::{
        selection::SelectionContext,
        simulation::{MastTable, RolloutPolicy},
    },
    stats::SearchStatistics,
    transposition::TranspositionTable,
    tree::{MCTSNode, NodeId, SearchTree},
    utils, Action, MCTSError, Result,
};

/// The tree shapes a search can use, each holding only the data it needs
enum Topology<A: Action> {
    /// One tree (shared, or restricted to the searching player), with
    /// optional OMA side tables
    Tree {
        tree: SearchTree<A>,
        oma: Option<OmaTable<A>>,
    },

    /// One tree per player, `None` until that player first acts
    MultiTree { roots: Vec<Option<SearchTree<A>>> },

    /// A graph whose nodes are shared through a transposition table
    Graph {
        tree: SearchTree<A>,
        table: TranspositionTable,
    },
}

/// The main Monte Carlo Tree Search implementation
///
/// One `MCTS` value serves one searching player. [`MCTS::search`] runs one
/// decision request against the current root state; [`MCTS::advance`] moves
/// to the next real decision, keeping the relevant subtree when tree reuse
/// is enabled.
pub struct MCTS<S: GameState> {
    /// State the search starts from; never mutated by a search
    root_state: S,

    /// The player the search decides for
    root_player: usize,

    /// Configuration for the search
    config: MCTSConfig,

    /// Statistics gathered during the last search
    statistics: SearchStatistics,

    rng: ChaCha20Rng,

    topology: Topology<S::Action>,

    /// MAST statistics shared across iterations
    mast: MastTable,

    /// Lowest and highest outcome backed up so far
    bounds: (f64, f64),

    /// Forward-model calls made over the lifetime of this instance
    forward_model_calls: u64,
}

impl<S: GameState> MCTS<S> {
    /// Creates a new MCTS instance with the given initial state and configuration
    ///
    /// Fails with [`MCTSError::InvalidConfiguration`] if the configuration is
    /// inconsistent, and with [`MCTSError::MissingFeatureVector`] if graph
    /// search is requested for a game without feature vectors.
    pub fn new(initial_state: S, config: MCTSConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let topology = Self::fresh_topology(&initial_state, &config, &mut rng)?;

        Ok(MCTS {
            root_player: initial_state.current_player(),
            mast: MastTable::new(initial_state.num_players()),
            root_state: initial_state,
            config,
            statistics: SearchStatistics::new(),
            rng,
            topology,
            bounds: (f64::INFINITY, f64::NEG_INFINITY),
            forward_model_calls: 0,
        })
    }

    fn fresh_topology(
        state: &S,
        config: &MCTSConfig,
        rng: &mut ChaCha20Rng,
    ) -> Result<Topology<S::Action>> {
        let player = state.current_player();
        let players = state.num_players();
        let seed = rng.next_u64();

        let topology = match config.opponent_tree_policy {
            OpponentTreePolicy::SelfOnly => Topology::Tree {
                tree: SearchTree::new(player, players, Some(player), seed),
                oma: None,
            },
            OpponentTreePolicy::OneTree => Topology::Tree {
                tree: SearchTree::new(player, players, None, seed),
                oma: None,
            },
            OpponentTreePolicy::Oma => Topology::Tree {
                tree: SearchTree::new(player, players, None, seed),
                oma: Some(OmaTable::new()),
            },
            OpponentTreePolicy::MultiTree => {
                let mut roots: Vec<Option<SearchTree<S::Action>>> =
                    (0..players).map(|_| None).collect();
                roots[player] = Some(SearchTree::new(player, players, Some(player), seed));
                Topology::MultiTree { roots }
            }
            OpponentTreePolicy::Mcgs => {
                let features = state
                    .feature_vector(player)
                    .ok_or(MCTSError::MissingFeatureVector)?;
                let tree = SearchTree::new(player, players, None, seed);
                let mut table = TranspositionTable::new(config.mcgs_resolution);
                let key = table.key(player, &features);
                table.insert(key, tree.root());
                Topology::Graph { tree, table }
            }
        };
        Ok(topology)
    }

    /// Runs the search with the configured budget and returns the action to play
    pub fn search(&mut self) -> Result<S::Action> {
        let budget = self.config.budget;
        self.run(budget)
    }

    /// Runs the search for the specified number of iterations
    pub fn search_for_iterations(&mut self, iterations: usize) -> Result<S::Action> {
        self.run(Budget::Iterations(iterations))
    }

    /// Runs the search for the specified duration
    pub fn search_for_time(&mut self, duration: Duration) -> Result<S::Action> {
        self.run(Budget::Time(duration))
    }

    fn run(&mut self, budget: Budget) -> Result<S::Action> {
        if self.root_state.is_terminal() || self.root_state.legal_actions().is_empty() {
            return Err(MCTSError::NoLegalActions);
        }

        self.statistics = SearchStatistics::new();
        if matches!(self.config.rollout_policy, RolloutPolicy::Mast) {
            self.mast.decay(self.config.mast_gamma);
        }

        let start_time = Instant::now();
        let calls_at_start = self.forward_model_calls;
        let mut avg_iteration = Duration::ZERO;
        let mut iterations = 0usize;

        loop {
            let stop = match budget {
                Budget::Iterations(limit) => iterations >= limit,
                Budget::ForwardModelCalls(limit) => {
                    self.forward_model_calls - calls_at_start >= limit as u64
                }
                Budget::Time(limit) => {
                    // Stop if one more average iteration would overrun.
                    let projected =
                        start_time.elapsed() + avg_iteration + self.config.time_safety_margin;
                    if projected >= limit {
                        self.statistics.stopped_early = true;
                        true
                    } else {
                        false
                    }
                }
            };
            if stop {
                break;
            }

            let iteration_start = Instant::now();
            self.execute_iteration()?;
            iterations += 1;

            let elapsed = iteration_start.elapsed();
            avg_iteration = if iterations == 1 {
                elapsed
            } else {
                (avg_iteration * 9 + elapsed) / 10
            };
        }

        self.statistics.iterations = iterations;
        self.statistics.forward_model_calls = self.forward_model_calls - calls_at_start;
        self.statistics.total_time = start_time.elapsed();
        self.statistics.tree_size = self.tree_size();
        let (trees, side_table_entries) = match &self.topology {
            Topology::Tree { oma, .. } => (1, oma.as_ref().map_or(0, OmaTable::len)),
            Topology::MultiTree { roots } => (roots.iter().flatten().count(), 0),
            Topology::Graph { table, .. } => (1, table.len()),
        };
        self.statistics.trees = trees;
        self.statistics.side_table_entries = side_table_entries;
        debug!("{}", self.statistics.summary());

        self.recommend()
    }

    /// Execute a single iteration of the MCTS algorithm
    fn execute_iteration(&mut self) -> Result<()> {
        let mut state = self.root_state.clone();
        self.forward_model_calls += 1;

        let mut ctx = IterationContext {
            config: &self.config,
            rng: &mut self.rng,
            mast: &mut self.mast,
            bounds: &mut self.bounds,
            forward_model_calls: &mut self.forward_model_calls,
            max_depth: &mut self.statistics.max_depth,
            root_player: self.root_player,
            actions_taken: Vec::new(),
        };

        let result = match &mut self.topology {
            Topology::Tree { tree, oma } => ctx.tree_iteration(tree, oma.as_mut(), &mut state),
            Topology::MultiTree { roots } => ctx.multi_tree_iteration(roots, &mut state),
            Topology::Graph { tree, table } => ctx.graph_iteration(tree, table, &mut state),
        };
        if result.is_err() {
            match &mut self.topology {
                Topology::Tree { tree, .. } | Topology::Graph { tree, .. } => tree.clear_pending(),
                Topology::MultiTree { roots } => {
                    roots.iter_mut().flatten().for_each(SearchTree::clear_pending)
                }
            }
        }
        result
    }

    /// Selects the action to play from the current trees
    ///
    /// Falls back to a uniformly random legal action if the root has no
    /// visited child.
    fn recommend(&mut self) -> Result<S::Action> {
        let criteria = self.config.best_child_criteria;
        let epsilon = self.config.epsilon;
        let choice = self.tree().and_then(|tree| tree.recommend(criteria, epsilon));
        match choice {
            Some(action) => Ok(action),
            None => self.fallback_action(),
        }
    }

    fn fallback_action(&mut self) -> Result<S::Action> {
        warn!("no visited root action, falling back to a random legal action");
        self.root_state
            .legal_actions()
            .choose(&mut self.rng)
            .cloned()
            .ok_or(MCTSError::NoLegalActions)
    }

    /// Moves the search to the next real decision point
    ///
    /// `actions` are the moves played since the last search, starting with
    /// the searching player's own. With tree reuse enabled the subtree they
    /// lead to becomes the new root, and everything above and beside it is
    /// dropped. Self-only trees follow only the first action, since opponent
    /// moves are not part of them. Returns whether a subtree was reused.
    pub fn advance(&mut self, actions: &[S::Action], new_state: S) -> Result<bool> {
        let player = new_state.current_player();
        let mut reused = false;

        if self.config.reuse_tree {
            if let Topology::Tree { tree, oma: None } = &mut self.topology {
                let path = match tree.owner() {
                    Some(_) => &actions[..actions.len().min(1)],
                    None => actions,
                };
                if let Some(id) = tree.follow(path) {
                    if tree.get(id).decision_player == player && tree.owns(player) {
                        *tree = tree.rootify(id);
                        reused = true;
                        debug!("reusing subtree with {} nodes", tree.len());
                    }
                }
            }
        }

        if !reused {
            self.topology = Self::fresh_topology(&new_state, &self.config, &mut self.rng)?;
        }
        self.root_state = new_state;
        self.root_player = player;
        Ok(reused)
    }

    /// The tree of the searching player
    ///
    /// For graph search this is the graph; for multi-tree search it is the
    /// searching player's own tree.
    pub fn tree(&self) -> Option<&SearchTree<S::Action>> {
        match &self.topology {
            Topology::Tree { tree, .. } | Topology::Graph { tree, .. } => Some(tree),
            Topology::MultiTree { roots } => roots.get(self.root_player).and_then(Option::as_ref),
        }
    }

    /// Per-player trees of a multi-tree search
    pub fn roots(&self) -> Option<&[Option<SearchTree<S::Action>>]> {
        match &self.topology {
            Topology::MultiTree { roots } => Some(roots),
            _ => None,
        }
    }

    /// The transposition table of a graph search
    pub fn transposition_table(&self) -> Option<&TranspositionTable> {
        match &self.topology {
            Topology::Graph { table, .. } => Some(table),
            _ => None,
        }
    }

    /// The OMA side tables of an OMA search
    pub fn oma_table(&self) -> Option<&OmaTable<S::Action>> {
        match &self.topology {
            Topology::Tree { oma, .. } => oma.as_ref(),
            _ => None,
        }
    }

    /// The MAST statistics
    pub fn mast_table(&self) -> &MastTable {
        &self.mast
    }

    /// The root action with the most visits, if any root action was visited
    pub fn most_visited_action(&self) -> Option<S::Action> {
        self.tree()
            .and_then(|tree| tree.most_visited_action(self.config.epsilon))
    }

    /// The root action with the highest mean value, if any root action was visited
    pub fn best_action(&self) -> Option<S::Action> {
        self.tree()
            .and_then(|tree| tree.best_action(self.config.epsilon))
    }

    /// Visit counts and values of the root actions, for aggregation
    pub fn root_summary(&self) -> RootSummary<S::Action> {
        let player = self.root_player;
        let Some(tree) = self.tree() else {
            return RootSummary {
                best: None,
                actions: Vec::new(),
            };
        };
        RootSummary {
            best: tree.recommend(self.config.best_child_criteria, self.config.epsilon),
            actions: tree
                .root_node()
                .edges
                .iter()
                .map(|edge| ActionSummary {
                    action: edge.action.clone(),
                    visits: edge.stats.visits,
                    total_value: edge.stats.total_value[player],
                })
                .collect(),
        }
    }

    /// Returns the search statistics
    pub fn get_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// The state searches start from
    pub fn root_state(&self) -> &S {
        &self.root_state
    }

    /// The configuration
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Forward-model calls made since this instance was created
    pub fn forward_model_calls(&self) -> u64 {
        self.forward_model_calls
    }

    /// Number of nodes across all trees
    pub fn tree_size(&self) -> usize {
        match &self.topology {
            Topology::Tree { tree, .. } | Topology::Graph { tree, .. } => tree.len(),
            Topology::MultiTree { roots } => roots.iter().flatten().map(SearchTree::len).sum(),
        }
    }

    /// Returns a visualization of the searching player's tree
    pub fn visualize_tree(&self) -> String {
        self.tree()
            .map(|tree| tree.visualize(usize::MAX))
            .unwrap_or_default()
    }
}

/// Mutable search state borrowed by one iteration
struct IterationContext<'a> {
    config: &'a MCTSConfig,
    rng: &'a mut ChaCha20Rng,
    mast: &'a mut MastTable,
    bounds: &'a mut (f64, f64),
    forward_model_calls: &'a mut u64,
    max_depth: &'a mut usize,
    root_player: usize,
    /// (player, MAST key) of every action applied this iteration
    actions_taken: Vec<(usize, usize)>,
}

impl IterationContext<'_> {
    fn apply<S: GameState>(&mut self, state: &mut S, action: &S::Action) -> Result<()> {
        let player = state.current_player();
        state.apply_action(action)?;
        *self.forward_model_calls += 1;
        self.actions_taken.push((player, action.mast_key()));
        Ok(())
    }

    /// Plays one rollout-policy move; returns false if no action is legal
    fn rollout_move<S: GameState>(&mut self, state: &mut S) -> Result<bool> {
        let actions = state.legal_actions();
        if actions.is_empty() {
            return Ok(false);
        }
        let index = self.config.rollout_policy.choose(
            &*state,
            &actions,
            &*self.mast,
            self.config,
            &mut *self.forward_model_calls,
            &mut *self.rng,
        )?;
        self.apply(state, &actions[index])?;
        Ok(true)
    }

    fn note_depth(&mut self, depth: usize) {
        *self.max_depth = (*self.max_depth).max(depth);
    }

    /// One tree-policy step from `node`
    ///
    /// Expands a random unexpanded legal action if there is one, otherwise
    /// descends the edge chosen by the selection policy. Returns the node
    /// reached and whether it was created by this step, or `None` if no
    /// action is legal.
    fn tree_step<S: GameState>(
        &mut self,
        tree: &mut SearchTree<S::Action>,
        oma: Option<&OmaTable<S::Action>>,
        node: NodeId,
        state: &mut S,
    ) -> Result<Option<(NodeId, bool)>> {
        let legal = state.legal_actions();
        if legal.is_empty() {
            return Ok(None);
        }
        let players = tree.num_players();
        let candidates = {
            let prior_state = &*state;
            tree.get_mut(node)
                .sync_edges(&legal, players, |a| prior_state.action_prior(a))
        };

        let unexpanded: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| tree.get(node).edges[i].child.is_none())
            .collect();

        if !unexpanded.is_empty() {
            let edge = unexpanded[self.rng.gen_range(0..unexpanded.len())];
            let action = tree.get(node).edges[edge].action.clone();
            self.apply(state, &action)?;
            let decision_player = tree.owner().unwrap_or_else(|| state.current_player());
            let child = tree.add_child(node, edge, decision_player);
            trace!("expanded {:?} at depth {}", action, tree.get(child).depth);
            return Ok(Some((child, true)));
        }

        let blended = oma.map(|table| oma_values(tree, table, node, &candidates));
        let selection = SelectionContext {
            config: self.config,
            bounds: *self.bounds,
            oma_values: blended.as_deref(),
        };
        let policy = self.config.selection_policy;
        let (edge, probability) =
            policy.select(tree.get(node), &candidates, &selection, &mut *self.rng);
        if policy.is_stochastic() {
            tree.get_mut(node).pending_probability = Some((edge, probability));
        }

        let (action, child) = {
            let e = &tree.get(node).edges[edge];
            (e.action.clone(), e.child)
        };
        self.apply(state, &action)?;
        Ok(Some(match child {
            Some(child) => (child, false),
            None => {
                let decision_player = tree.owner().unwrap_or_else(|| state.current_player());
                (tree.add_child(node, edge, decision_player), true)
            }
        }))
    }

    /// Iteration over a single tree (self-only, one-tree, OMA)
    fn tree_iteration<S: GameState>(
        &mut self,
        tree: &mut SearchTree<S::Action>,
        mut oma: Option<&mut OmaTable<S::Action>>,
        state: &mut S,
    ) -> Result<()> {
        let mut node = tree.root();
        let mut in_tree = true;
        let mut rollout_steps = 0;

        while !state.is_terminal() {
            let player = state.current_player();
            if in_tree && tree.owns(player) {
                if tree.get(node).depth >= self.config.max_tree_depth {
                    in_tree = false;
                    continue;
                }
                match self.tree_step(tree, oma.as_deref(), node, state)? {
                    Some((next, expanded)) => {
                        node = next;
                        in_tree = !expanded;
                        self.note_depth(tree.get(node).depth);
                    }
                    None => break,
                }
            } else if in_tree {
                // An opponent outside a self-only tree: a stochastic transition.
                if !self.rollout_move(state)? {
                    break;
                }
            } else {
                if rollout_steps >= self.config.rollout_length || !self.rollout_move(state)? {
                    break;
                }
                rollout_steps += 1;
            }
        }

        let outcome = self.prepare_outcome(evaluate(state));
        self.backup_path(tree, oma.as_deref_mut(), node, &outcome);
        Ok(())
    }

    /// Iteration over one tree per player
    ///
    /// Each player descends their own tree whenever they act, until they
    /// have expanded one node this iteration. After that their moves come
    /// from the rollout policy. The rollout-length cap starts counting once
    /// the searching player has expanded.
    fn multi_tree_iteration<S: GameState>(
        &mut self,
        roots: &mut [Option<SearchTree<S::Action>>],
        state: &mut S,
    ) -> Result<()> {
        let players = roots.len();
        let mut cursor: Vec<Option<NodeId>> = vec![None; players];
        let mut expanded = vec![false; players];
        let mut rollout_steps = 0;

        while !state.is_terminal() {
            let player = state.current_player();
            if !expanded[player] {
                if roots[player].is_none() {
                    debug!("rooting tree for player {}", player);
                    let seed = self.rng.next_u64();
                    roots[player] = Some(SearchTree::new(player, players, Some(player), seed));
                }
                let Some(tree) = roots[player].as_mut() else {
                    break;
                };
                let node = cursor[player].unwrap_or_else(|| tree.root());
                cursor[player] = Some(node);
                if tree.get(node).depth >= self.config.max_tree_depth {
                    expanded[player] = true;
                    continue;
                }
                match self.tree_step(tree, None, node, state)? {
                    Some((next, created)) => {
                        cursor[player] = Some(next);
                        expanded[player] = created;
                        if player == self.root_player {
                            self.note_depth(tree.get(next).depth);
                        }
                    }
                    None => break,
                }
                continue;
            }

            if expanded[self.root_player] {
                if rollout_steps >= self.config.rollout_length {
                    break;
                }
                rollout_steps += 1;
            }
            if !self.rollout_move(state)? {
                break;
            }
        }

        let outcome = self.prepare_outcome(evaluate(state));
        for (player, leaf) in cursor.into_iter().enumerate() {
            if let (Some(leaf), Some(tree)) = (leaf, roots[player].as_mut()) {
                self.backup_path(tree, None, leaf, &outcome);
            }
        }
        Ok(())
    }

    /// Iteration over a transposition graph
    ///
    /// The descent records its trajectory of (node, edge) pairs, because a
    /// node can be reached along several paths and parent links no longer
    /// identify the one taken.
    fn graph_iteration<S: GameState>(
        &mut self,
        graph: &mut SearchTree<S::Action>,
        table: &mut TranspositionTable,
        state: &mut S,
    ) -> Result<()> {
        let players = graph.num_players();
        let mut node = graph.root();
        let mut trajectory: Vec<(NodeId, usize, Option<f64>)> = Vec::new();

        while !state.is_terminal() && trajectory.len() < self.config.max_tree_depth {
            let legal = state.legal_actions();
            if legal.is_empty() {
                break;
            }
            let candidates = {
                let prior_state = &*state;
                graph
                    .get_mut(node)
                    .sync_edges(&legal, players, |a| prior_state.action_prior(a))
            };
            let unexpanded: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| graph.get(node).edges[i].child.is_none())
                .collect();

            let (edge, probability) = if unexpanded.is_empty() {
                let selection = SelectionContext {
                    config: self.config,
                    bounds: *self.bounds,
                    oma_values: None,
                };
                let policy = self.config.selection_policy;
                let (edge, p) =
                    policy.select(graph.get(node), &candidates, &selection, &mut *self.rng);
                (edge, policy.is_stochastic().then_some(p))
            } else {
                (unexpanded[self.rng.gen_range(0..unexpanded.len())], None)
            };

            let action = graph.get(node).edges[edge].action.clone();
            self.apply(state, &action)?;
            trajectory.push((node, edge, probability));

            let player = state.current_player();
            let features = state
                .feature_vector(player)
                .ok_or(MCTSError::MissingFeatureVector)?;
            let key = table.key(player, &features);

            match table.get(&key) {
                Some(existing) => {
                    graph.get_mut(node).edges[edge].child = Some(existing);
                    node = existing;
                }
                None => {
                    let depth = trajectory.len();
                    let created = MCTSNode::new(Some(node), Some(action), depth, player);
                    let id = graph.allocate(created);
                    graph.get_mut(node).edges[edge].child = Some(id);
                    trace!("registered graph node {} for key {}", id.0, key);
                    table.insert(key, id);
                    node = id;
                    self.note_depth(depth);
                    break;
                }
            }
        }

        let mut rollout_steps = 0;
        while !state.is_terminal() && rollout_steps < self.config.rollout_length {
            if !self.rollout_move(state)? {
                break;
            }
            rollout_steps += 1;
        }

        let outcome = self.prepare_outcome(evaluate(state));
        graph.get_mut(node).visits += 1;
        for (id, edge, probability) in trajectory {
            let player = graph.get(id).decision_player;
            let reward = self.reward(outcome[player]);
            let visited = graph.get_mut(id);
            visited.visits += 1;
            visited.edges[edge].stats.update(&outcome);
            if let Some(p) = probability {
                self.config.selection_policy.update(visited, edge, p, reward);
            }
        }
        Ok(())
    }

    /// Applies the paranoid transform and records bounds and MAST statistics
    fn prepare_outcome(&mut self, mut outcome: Vec<f64>) -> Vec<f64> {
        if self.config.paranoid {
            let own = outcome[self.root_player];
            for (p, value) in outcome.iter_mut().enumerate() {
                *value = if p == self.root_player { own } else { -own };
            }
        }
        for &value in &outcome {
            self.bounds.0 = self.bounds.0.min(value);
            self.bounds.1 = self.bounds.1.max(value);
        }
        if matches!(self.config.rollout_policy, RolloutPolicy::Mast) {
            for &(player, key) in &self.actions_taken {
                self.mast.update(player, key, outcome[player]);
            }
        }
        outcome
    }

    /// A value rescaled to `[0, 1]` for the bandit policies
    fn reward(&self, value: f64) -> f64 {
        utils::normalise(value, self.bounds.0, self.bounds.1)
    }

    /// Backs `outcome` up from `leaf` to the root through parent links
    fn backup_path<A: Action>(
        &mut self,
        tree: &mut SearchTree<A>,
        mut oma: Option<&mut OmaTable<A>>,
        leaf: NodeId,
        outcome: &[f64],
    ) {
        tree.get_mut(leaf).visits += 1;
        for (id, edge) in tree.path_to_root(leaf) {
            if let Some(table) = oma.as_deref_mut() {
                let node = tree.get(id);
                if let Some(oma_parent) = node.oma_parent {
                    if let Some(parent_action) = tree.action_taken_at(oma_parent, id) {
                        let own_action = &node.edges[edge].action;
                        let value = outcome[node.decision_player];
                        table.update(oma_parent, parent_action, own_action, value);
                    }
                }
            }

            let reward = self.reward(outcome[tree.get(id).decision_player]);
            let node = tree.get_mut(id);
            node.visits += 1;
            node.edges[edge].stats.update(outcome);
            if let Some((chosen, probability)) = node.pending_probability.take() {
                self.config
                    .selection_policy
                    .update(node, chosen, probability, reward);
            }
        }
    }
}

/// Terminal scores, or heuristic values of a non-terminal state, per player
fn evaluate<S: GameState>(state: &S) -> Vec<f64> {
    let terminal = state.is_terminal();
    (0..state.num_players())
        .map(|p| {
            if terminal {
                state.score(p)
            } else {
                state.heuristic(p)
            }
        })
        .collect()
}

/// OMA mean values for each candidate edge of `node`
fn oma_values<A: Action>(
    tree: &SearchTree<A>,
    table: &OmaTable<A>,
    node: NodeId,
    candidates: &[usize],
) -> Vec<Option<f64>> {
    let current = tree.get(node);
    let context = current
        .oma_parent
        .and_then(|op| tree.action_taken_at(op, node).map(|a| (op, a)));
    candidates
        .iter()
        .map(|&i| {
            let (op, parent_action) = context?;
            table
                .get(op, parent_action, &current.edges[i].action)
                .and_then(OmaStats::mean)
        })
        .collect()
}
