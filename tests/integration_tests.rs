mod common;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use common::{PickItems, TicTacMove, TicTacToe};
use multiplayer_mcts::{
    config::BestChildCriteria, Action, ForwardModelError, GameState, MCTSConfig, MCTSError,
    SearchTree, SelectionPolicy, MCTS,
};

#[test]
fn test_mcts_basic_functionality() {
    let initial_state = TicTacToe::new();

    let config = MCTSConfig::default()
        .with_exploration_constant(1.414)
        .with_max_iterations(100);

    let mut mcts = MCTS::new(initial_state, config).unwrap();

    // Make sure we can run a search without errors
    let result = mcts.search();
    assert!(result.is_ok(), "MCTS search should succeed");

    let action = result.unwrap();
    assert!(action.position < 9, "Action should be valid");

    // Verify statistics
    let stats = mcts.get_statistics();
    assert_eq!(
        stats.iterations, 100,
        "Should have performed expected iterations"
    );
    assert!(stats.tree_size > 1, "Tree should have grown");
    assert!(stats.summary().contains("Iterations: 100"));
}

#[test]
fn test_mcts_finds_winning_move() {
    // X X -
    // O O -
    // - - -
    let game = TicTacToe::from_board("XX-OO----", 0);

    let config = MCTSConfig::default()
        .with_max_iterations(2000)
        .with_best_child_criteria(BestChildCriteria::MostVisits)
        .with_seed(17);

    let mut mcts = MCTS::new(game, config).unwrap();

    let result = mcts.search().unwrap();
    assert_eq!(result, TicTacMove { position: 2 }, "MCTS should find the winning move");
}

#[test]
fn test_mcts_blocks_opponent_win() {
    // X X -
    // O - -
    // - - -
    let game = TicTacToe::from_board("XX-O-----", 1);

    let config = MCTSConfig::default().with_max_iterations(5000).with_seed(23);
    let mut mcts = MCTS::new(game, config).unwrap();

    let result = mcts.search().unwrap();
    assert_eq!(result.position, 2, "O must block the top row");
}

#[test]
fn test_mcts_with_other_selection_policies() {
    for policy in [
        SelectionPolicy::Ucb1Tuned,
        SelectionPolicy::Exp3,
        SelectionPolicy::RegretMatching,
        SelectionPolicy::Hedge,
        SelectionPolicy::AlphaGo,
    ] {
        let game = TicTacToe::from_board("XX-OO----", 0);
        let config = MCTSConfig::default()
            .with_max_iterations(3000)
            .with_selection_policy(policy)
            .with_seed(5);
        let mut mcts = MCTS::new(game, config).unwrap();

        let result = mcts.search().unwrap();
        assert_eq!(result.position, 2, "{:?} should find the winning move", policy);
    }
}

#[test]
fn test_empty_game_state() {
    // A full board has no legal moves
    let game = TicTacToe::from_board("XOXXOOOXX", 0);

    let config = MCTSConfig::default();
    let mut mcts = MCTS::new(game, config).unwrap();

    let result = mcts.search();
    assert_eq!(result.unwrap_err(), MCTSError::NoLegalActions);
}

#[test]
fn test_single_legal_action() {
    let game = PickItems::new(1, vec![0.3], 1);
    let config = MCTSConfig::default().with_max_iterations(10);
    let mut mcts = MCTS::new(game, config).unwrap();

    assert_eq!(mcts.search().unwrap(), 0);
}

#[test]
fn test_zero_iterations_falls_back_to_legal_action() {
    let game = TicTacToe::from_board("XX-OO----", 0);
    let config = MCTSConfig::default().with_max_iterations(0).with_seed(1);
    let mut mcts = MCTS::new(game.clone(), config).unwrap();

    let action = mcts.search().unwrap();
    assert!(game.legal_actions().contains(&action));
    assert_eq!(mcts.get_statistics().iterations, 0);
    assert!(mcts.most_visited_action().is_none());
}

#[test]
fn test_backup_accumulates_outcomes() {
    // Picking one item ends the game, so every iteration is one expansion
    // or selection followed by a terminal evaluation.
    let game = PickItems::new(2, vec![0.25, 0.75], 1);
    let config = MCTSConfig::default().with_max_iterations(100).with_seed(9);
    let mut mcts = MCTS::new(game, config).unwrap();

    let action = mcts.search().unwrap();
    assert_eq!(action, 1);

    let tree = mcts.tree().unwrap();
    let root = tree.root_node();
    assert_eq!(root.visits, 100);
    assert_eq!(root.edge_visits(), 100);

    for edge in &root.edges {
        let value = game_value(edge.action);
        let visits = edge.stats.visits as f64;
        assert!((edge.stats.total_value[0] - value * visits).abs() < 1e-9);
        assert!((edge.stats.total_value[1] + value * visits).abs() < 1e-9);
        assert!((edge.stats.squared_total_value[0] - value * value * visits).abs() < 1e-9);
    }

    // One root copy and one action application per iteration
    assert_eq!(mcts.get_statistics().forward_model_calls, 200);
    assert_eq!(mcts.forward_model_calls(), 200);
}

fn game_value(item: usize) -> f64 {
    [0.25, 0.75][item]
}

#[test]
fn test_seeded_searches_are_reproducible() {
    let run = || {
        let config = MCTSConfig::default().with_max_iterations(500).with_seed(99);
        let mut mcts = MCTS::new(TicTacToe::new(), config).unwrap();
        let action = mcts.search().unwrap();
        let visits: Vec<(usize, u64)> = mcts
            .tree()
            .unwrap()
            .root_node()
            .edges
            .iter()
            .map(|e| (e.action.position, e.stats.visits))
            .collect();
        (action, visits, mcts.tree_size())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_recommendation_is_stable() {
    let config = MCTSConfig::default().with_max_iterations(300).with_seed(4);
    let mut mcts = MCTS::new(TicTacToe::new(), config).unwrap();
    let action = mcts.search().unwrap();

    assert_eq!(mcts.most_visited_action(), Some(action.clone()));
    assert_eq!(mcts.most_visited_action(), mcts.most_visited_action());
    assert_eq!(mcts.best_action(), mcts.best_action());
}

fn tied_tree(seed: u64) -> SearchTree<usize> {
    let mut tree = SearchTree::new(0, 1, None, seed);
    let root = tree.root();
    tree.get_mut(root).sync_edges(&[0, 1], 1, |_| 1.0);
    for edge in &mut tree.get_mut(root).edges {
        for _ in 0..5 {
            edge.stats.update(&[0.5]);
        }
    }
    tree.get_mut(root).visits = 10;
    tree
}

#[test]
fn test_tie_break_noise_follows_epsilon() {
    // Without noise an exact tie goes to the first edge whatever the seed
    for seed in 0..32 {
        let tree = tied_tree(seed);
        assert_eq!(tree.most_visited_action(0.0), Some(0));
        assert_eq!(tree.best_action(0.0), Some(0));
    }

    let picks: Vec<usize> = (0..32)
        .filter_map(|seed| tied_tree(seed).most_visited_action(1e-3))
        .collect();
    assert!(picks.contains(&0) && picks.contains(&1));
}

#[test]
fn test_highest_value_criteria() {
    let game = PickItems::new(1, vec![0.1, 0.2, 0.9, 0.4], 1);
    let config = MCTSConfig::default()
        .with_max_iterations(40)
        .with_best_child_criteria(BestChildCriteria::HighestValue)
        .with_seed(2);
    let mut mcts = MCTS::new(game, config).unwrap();

    assert_eq!(mcts.search().unwrap(), 2);
    assert_eq!(mcts.best_action(), Some(2));
}

#[test]
fn test_root_state_is_not_mutated() {
    let game = TicTacToe::from_board("X---O----", 0);
    let config = MCTSConfig::default().with_max_iterations(200);
    let mut mcts = MCTS::new(game.clone(), config).unwrap();
    mcts.search().unwrap();

    assert_eq!(mcts.root_state().board, game.board);
    assert_eq!(mcts.root_state().moves_played, 2);
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Poke;

impl Action for Poke {
    fn id(&self) -> usize {
        0
    }
}

/// A game whose forward model rejects every action
#[derive(Clone)]
struct Broken;

impl GameState for Broken {
    type Action = Poke;

    fn num_players(&self) -> usize {
        1
    }

    fn current_player(&self) -> usize {
        0
    }

    fn is_terminal(&self) -> bool {
        false
    }

    fn legal_actions(&self) -> Vec<Poke> {
        vec![Poke]
    }

    fn apply_action(&mut self, _action: &Poke) -> Result<(), ForwardModelError> {
        Err(ForwardModelError::new("poke is not allowed"))
    }

    fn score(&self, _player: usize) -> f64 {
        0.0
    }
}

#[test]
fn test_forward_model_errors_abort_search() {
    let config = MCTSConfig::default().with_max_iterations(10);
    let mut mcts = MCTS::new(Broken, config).unwrap();

    match mcts.search() {
        Err(MCTSError::ForwardModel(e)) => assert!(e.to_string().contains("poke")),
        other => panic!("expected a forward model error, got {:?}", other.map(|_| ())),
    }
}

/// Two moves of 0 or 1; the forward model fails while `faulty` is set
#[derive(Clone)]
struct Flaky {
    moves: usize,
    faulty: Arc<AtomicBool>,
}

impl GameState for Flaky {
    type Action = usize;

    fn num_players(&self) -> usize {
        1
    }

    fn current_player(&self) -> usize {
        0
    }

    fn is_terminal(&self) -> bool {
        self.moves == 2
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            Vec::new()
        } else {
            vec![0, 1]
        }
    }

    fn apply_action(&mut self, _action: &usize) -> Result<(), ForwardModelError> {
        if self.faulty.load(Ordering::SeqCst) {
            return Err(ForwardModelError::new("model offline"));
        }
        self.moves += 1;
        Ok(())
    }

    fn score(&self, _player: usize) -> f64 {
        1.0
    }
}

#[test]
fn test_failed_iteration_leaves_no_pending_selection() {
    let faulty = Arc::new(AtomicBool::new(false));
    let game = Flaky {
        moves: 0,
        faulty: faulty.clone(),
    };
    let config = MCTSConfig::default()
        .with_selection_policy(SelectionPolicy::Exp3)
        .with_seed(3);
    let mut mcts = MCTS::new(game, config).unwrap();
    mcts.search_for_iterations(20).unwrap();

    faulty.store(true, Ordering::SeqCst);
    assert!(matches!(
        mcts.search_for_iterations(5),
        Err(MCTSError::ForwardModel(_))
    ));

    let tree = mcts.tree().unwrap();
    for id in tree.node_ids() {
        assert_eq!(tree.get(id).pending_selection(), None);
    }

    faulty.store(false, Ordering::SeqCst);
    mcts.search_for_iterations(10).unwrap();
    assert_eq!(mcts.tree().unwrap().root_node().visits, 30);
}
