//! Tree data structures for Monte Carlo Tree Search
//!
//! Nodes live in an arena ([`SearchTree`]) and refer to each other by
//! [`NodeId`]. A node holds the index of its parent rather than a pointer, and
//! its outgoing edges own the ids of its children, so there are no ownership
//! cycles and ancestor walks stay O(depth).
//!
//! The search is open-loop: nodes do not store game states. Every iteration
//! replays actions on a fresh copy of the root state.

use std::collections::{HashMap, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::{config::BestChildCriteria, game_state::Action, utils};

/// Index of a node in a [`SearchTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Aggregated outcomes of every backup through one action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStats {
    /// Number of backups through this action
    pub visits: u64,

    /// Sum of backed-up outcomes, one entry per player
    pub total_value: Vec<f64>,

    /// Sum of squared outcomes, one entry per player
    pub squared_total_value: Vec<f64>,
}

impl ActionStats {
    /// Creates empty statistics for `num_players` players
    pub fn new(num_players: usize) -> Self {
        ActionStats {
            visits: 0,
            total_value: vec![0.0; num_players],
            squared_total_value: vec![0.0; num_players],
        }
    }

    /// Adds one outcome vector
    pub fn update(&mut self, outcome: &[f64]) {
        self.visits += 1;
        for (p, v) in outcome.iter().enumerate() {
            self.total_value[p] += v;
            self.squared_total_value[p] += v * v;
        }
    }

    /// Mean outcome for a player, 0.0 if never visited
    pub fn mean(&self, player: usize) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        self.total_value[player] / self.visits as f64
    }

    /// Empirical variance of the outcome for a player
    pub fn variance(&self, player: usize) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        let mean = self.mean(player);
        (self.squared_total_value[player] / self.visits as f64 - mean * mean).max(0.0)
    }
}

/// An outgoing edge of a node: one legal action and what is known about it
#[derive(Debug, Clone)]
pub struct Edge<A: Action> {
    /// The action this edge represents
    pub action: A,

    /// The node reached by this action, `None` until expanded
    pub child: Option<NodeId>,

    /// Statistics of backups through this action
    pub stats: ActionStats,

    /// Unnormalised prior weight reported by the game
    pub prior: f64,

    /// Bandit state: cumulative EXP3 gain or cumulative regret
    pub bandit: f64,
}

/// Represents a node in the MCTS tree
pub struct MCTSNode<A: Action> {
    /// Parent node (None for root)
    pub parent: Option<NodeId>,

    /// The action taken at the parent to reach this node (None for root)
    pub action_to_reach: Option<A>,

    /// Depth of this node in the tree (root = 0)
    pub depth: usize,

    /// The player who acts at this node
    pub decision_player: usize,

    /// Outgoing edges, in the order actions were first seen
    pub edges: Vec<Edge<A>>,

    /// Number of backups that passed through this node
    pub visits: u64,

    /// Nearest ancestor at which the same player acted
    pub oma_parent: Option<NodeId>,

    /// Probability with which the current iteration selected an edge here
    pub(crate) pending_probability: Option<(usize, f64)>,
}

impl<A: Action> MCTSNode<A> {
    /// Creates a node without edges
    pub fn new(
        parent: Option<NodeId>,
        action_to_reach: Option<A>,
        depth: usize,
        decision_player: usize,
    ) -> Self {
        MCTSNode {
            parent,
            action_to_reach,
            depth,
            decision_player,
            edges: Vec::new(),
            visits: 0,
            oma_parent: None,
            pending_probability: None,
        }
    }

    /// Registers the currently legal actions and returns their edge indices
    ///
    /// Actions not seen before are appended as unexpanded edges, so the edge
    /// order is stable across iterations.
    pub fn sync_edges(
        &mut self,
        legal: &[A],
        num_players: usize,
        prior: impl Fn(&A) -> f64,
    ) -> Vec<usize> {
        legal
            .iter()
            .map(|action| match self.edge_index(action) {
                Some(index) => index,
                None => {
                    self.edges.push(Edge {
                        action: action.clone(),
                        child: None,
                        stats: ActionStats::new(num_players),
                        prior: prior(action).max(0.0),
                        bandit: 0.0,
                    });
                    self.edges.len() - 1
                }
            })
            .collect()
    }

    /// Position of an action among this node's edges
    pub fn edge_index(&self, action: &A) -> Option<usize> {
        self.edges.iter().position(|e| &e.action == action)
    }

    /// Returns the edge for an action
    pub fn edge(&self, action: &A) -> Option<&Edge<A>> {
        self.edges.iter().find(|e| &e.action == action)
    }

    /// Child reached by an action, if expanded
    pub fn child(&self, action: &A) -> Option<NodeId> {
        self.edge(action).and_then(|e| e.child)
    }

    /// Returns true if every known edge has a child
    pub fn is_fully_expanded(&self) -> bool {
        self.edges.iter().all(|e| e.child.is_some())
    }

    /// Returns true if this node has no expanded children
    pub fn is_leaf(&self) -> bool {
        self.edges.iter().all(|e| e.child.is_none())
    }

    /// Edge and probability chosen by a stochastic policy and not yet backed up
    pub fn pending_selection(&self) -> Option<(usize, f64)> {
        self.pending_probability
    }

    /// Sum of the visit counts of all edges
    pub fn edge_visits(&self) -> u64 {
        self.edges.iter().map(|e| e.stats.visits).sum()
    }

    /// Mean value of this node for its decision player, over all edges
    pub fn value(&self) -> f64 {
        let visits = self.edge_visits();
        if visits == 0 {
            return 0.0;
        }
        let total: f64 = self
            .edges
            .iter()
            .map(|e| e.stats.total_value[self.decision_player])
            .sum();
        total / visits as f64
    }
}

/// An arena of [`MCTSNode`]s forming one search tree (or graph)
pub struct SearchTree<A: Action> {
    nodes: Vec<MCTSNode<A>>,
    num_players: usize,
    owner: Option<usize>,
    tie_break_seed: u64,
}

impl<A: Action> SearchTree<A> {
    /// Creates a tree containing only a root for `root_player`
    ///
    /// `owner` restricts the tree to one player's decisions; `None` means the
    /// tree holds every player's decisions.
    pub fn new(
        root_player: usize,
        num_players: usize,
        owner: Option<usize>,
        tie_break_seed: u64,
    ) -> Self {
        SearchTree {
            nodes: vec![MCTSNode::new(None, None, 0, root_player)],
            num_players,
            owner,
            tie_break_seed,
        }
    }

    /// The root node id
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The root node
    pub fn root_node(&self) -> &MCTSNode<A> {
        &self.nodes[0]
    }

    /// Get a reference to a node by id
    pub fn get(&self, id: NodeId) -> &MCTSNode<A> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by id
    pub fn get_mut(&mut self, id: NodeId) -> &mut MCTSNode<A> {
        &mut self.nodes[id.0]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all node ids
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Number of players the statistics are kept for
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// The player whose decisions this tree holds, if restricted
    pub fn owner(&self) -> Option<usize> {
        self.owner
    }

    /// Returns true if decisions of `player` are represented in this tree
    pub fn owns(&self, player: usize) -> bool {
        self.owner.map_or(true, |owner| owner == player)
    }

    /// Deepest node depth in the tree
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Creates the child for edge `edge` of `parent`
    pub fn add_child(&mut self, parent: NodeId, edge: usize, decision_player: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (action, depth) = {
            let p = self.get(parent);
            (p.edges[edge].action.clone(), p.depth + 1)
        };
        let mut child = MCTSNode::new(Some(parent), Some(action), depth, decision_player);
        child.oma_parent = self.nearest_ancestor_of_player(parent, decision_player);
        self.nodes.push(child);
        self.get_mut(parent).edges[edge].child = Some(id);
        id
    }

    /// Forgets selections of an iteration that never reached its backup
    pub(crate) fn clear_pending(&mut self) {
        for node in &mut self.nodes {
            node.pending_probability = None;
        }
    }

    /// Creates a node without linking it to a parent edge
    ///
    /// Used by graph search, where the node is linked separately.
    pub(crate) fn allocate(&mut self, node: MCTSNode<A>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Nearest node at or above `from` where `player` acts
    fn nearest_ancestor_of_player(&self, from: NodeId, player: usize) -> Option<NodeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.get(id);
            if node.decision_player == player {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    /// The action taken at `ancestor` on the path from the root to `descendant`
    pub fn action_taken_at(&self, ancestor: NodeId, descendant: NodeId) -> Option<&A> {
        let mut current = descendant;
        loop {
            let node = self.get(current);
            match node.parent {
                Some(parent) if parent == ancestor => return node.action_to_reach.as_ref(),
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// The (ancestor, edge index) pairs from `leaf`'s parent up to the root
    pub fn path_to_root(&self, leaf: NodeId) -> Vec<(NodeId, usize)> {
        let mut path = Vec::with_capacity(self.get(leaf).depth);
        let mut current = leaf;
        while let Some(parent) = self.get(current).parent {
            let Some(edge) = self
                .get(current)
                .action_to_reach
                .as_ref()
                .and_then(|a| self.get(parent).edge_index(a))
            else {
                break;
            };
            path.push((parent, edge));
            current = parent;
        }
        path
    }

    /// Follows a sequence of actions from the root through expanded edges
    pub fn follow(&self, actions: &[A]) -> Option<NodeId> {
        actions
            .iter()
            .try_fold(self.root(), |node, action| self.get(node).child(action))
    }

    /// Builds a new tree whose root is `new_root`
    ///
    /// Only the subtree below `new_root` is kept. Ancestors and siblings are
    /// dropped and node ids are renumbered.
    pub fn rootify(&self, new_root: NodeId) -> SearchTree<A> {
        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([new_root]);
        while let Some(id) = queue.pop_front() {
            remap.insert(id, NodeId(order.len()));
            order.push(id);
            for edge in &self.get(id).edges {
                if let Some(child) = edge.child {
                    if !remap.contains_key(&child) {
                        queue.push_back(child);
                    }
                }
            }
        }

        let base_depth = self.get(new_root).depth;
        let nodes = order
            .iter()
            .map(|&old| {
                let node = self.get(old);
                let is_root = old == new_root;
                MCTSNode {
                    parent: if is_root {
                        None
                    } else {
                        node.parent.and_then(|p| remap.get(&p).copied())
                    },
                    action_to_reach: if is_root {
                        None
                    } else {
                        node.action_to_reach.clone()
                    },
                    depth: node.depth - base_depth,
                    decision_player: node.decision_player,
                    edges: node
                        .edges
                        .iter()
                        .map(|e| Edge {
                            child: e.child.and_then(|c| remap.get(&c).copied()),
                            ..e.clone()
                        })
                        .collect(),
                    visits: node.visits,
                    oma_parent: node.oma_parent.and_then(|p| remap.get(&p).copied()),
                    pending_probability: None,
                }
            })
            .collect();

        SearchTree {
            nodes,
            num_players: self.num_players,
            owner: self.owner,
            tie_break_seed: self.tie_break_seed,
        }
    }

    /// Recommends the action to play from the root
    ///
    /// Returns `None` when no root edge has been visited, so the caller can
    /// fall back to a random legal action. `epsilon` scales the tie-break noise.
    pub fn recommend(&self, criteria: BestChildCriteria, epsilon: f64) -> Option<A> {
        match criteria {
            BestChildCriteria::MostVisits => self.most_visited_action(epsilon),
            BestChildCriteria::HighestValue => self.best_action(epsilon),
        }
    }

    /// The root action with the most visits
    ///
    /// Ties are broken by mean value, then by a perturbation seeded per tree,
    /// so repeated calls on an unchanged tree agree.
    pub fn most_visited_action(&self, epsilon: f64) -> Option<A> {
        let root = self.root_node();
        let player = root.decision_player;
        let mut rng = ChaCha20Rng::seed_from_u64(self.tie_break_seed);
        let visited: Vec<&Edge<A>> = root.edges.iter().filter(|e| e.stats.visits > 0).collect();
        let max_visits = visited.iter().map(|e| e.stats.visits).max()?;
        let scores: Vec<f64> = visited
            .iter()
            .map(|e| {
                if e.stats.visits == max_visits {
                    utils::noise(e.stats.mean(player), epsilon, &mut rng)
                } else {
                    f64::NEG_INFINITY
                }
            })
            .collect();
        utils::argmax(&scores).map(|i| visited[i].action.clone())
    }

    /// The root action with the highest mean value for the root player
    pub fn best_action(&self, epsilon: f64) -> Option<A> {
        let root = self.root_node();
        let player = root.decision_player;
        let mut rng = ChaCha20Rng::seed_from_u64(self.tie_break_seed);
        let visited: Vec<&Edge<A>> = root.edges.iter().filter(|e| e.stats.visits > 0).collect();
        let scores: Vec<f64> = visited
            .iter()
            .map(|e| utils::noise(e.stats.mean(player), epsilon, &mut rng))
            .collect();
        utils::argmax(&scores).map(|i| visited[i].action.clone())
    }

    /// Returns a visualization of the tree
    pub fn visualize(&self, max_depth: usize) -> String {
        let mut result = String::new();
        self.visualize_node(self.root(), None, 0, max_depth, &mut result);
        result
    }

    fn visualize_node(
        &self,
        id: NodeId,
        via: Option<(&Edge<A>, usize)>,
        indent: usize,
        max_depth: usize,
        output: &mut String,
    ) {
        let node = self.get(id);
        let label = match via {
            Some((edge, player)) => format!(
                "{:?} (visits: {}, value: {:.3})",
                edge.action,
                edge.stats.visits,
                edge.stats.mean(player)
            ),
            None => format!("Root (visits: {}, player: {})", node.visits, node.decision_player),
        };
        output.push_str(&format!("{}{}\n", "  ".repeat(indent), label));

        if indent >= max_depth {
            return;
        }
        for edge in &node.edges {
            if let Some(child) = edge.child {
                // Graph search can link back to a shallower node.
                if self.get(child).depth > node.depth {
                    let via = Some((edge, node.decision_player));
                    self.visualize_node(child, via, indent + 1, max_depth, output);
                }
            }
        }
    }
}
