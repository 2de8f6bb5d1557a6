mod common;

use common::Race;
use multiplayer_mcts::{
    config::{BestChildCriteria, Budget, OpponentTreePolicy},
    MCTSConfig, MCTSError, RolloutPolicy, SelectionPolicy, MCTS,
};
use std::time::Duration;

#[test]
fn test_config_builder_methods() {
    // Test that all builder methods correctly set their respective values
    let config = MCTSConfig::default()
        .with_exploration_constant(2.0)
        .with_max_iterations(5000)
        .with_max_tree_depth(20)
        .with_rollout_length(0)
        .with_selection_policy(SelectionPolicy::Exp3)
        .with_rollout_policy(RolloutPolicy::Mast)
        .with_opponent_tree_policy(OpponentTreePolicy::Oma)
        .with_oma_weight(0.25)
        .with_mast(0.5, 0.1, 0.2)
        .with_best_child_criteria(BestChildCriteria::HighestValue)
        .with_seed(42);

    // Verify each setting was applied correctly
    assert_eq!(config.exploration_constant, 2.0);
    assert_eq!(config.budget, Budget::Iterations(5000));
    assert_eq!(config.max_tree_depth, 20);
    assert_eq!(config.rollout_length, 0);
    assert_eq!(config.selection_policy, SelectionPolicy::Exp3);
    assert_eq!(config.rollout_policy, RolloutPolicy::Mast);
    assert_eq!(config.opponent_tree_policy, OpponentTreePolicy::Oma);
    assert_eq!(config.oma_weight, 0.25);
    assert_eq!(config.mast_boltzmann, 0.5);
    assert_eq!(config.mast_epsilon, 0.1);
    assert_eq!(config.mast_default_value, 0.2);
    assert_eq!(config.best_child_criteria, BestChildCriteria::HighestValue);
    assert_eq!(config.seed, Some(42));
    assert!(config.validate().is_ok());

    let timed = config.with_max_time(Duration::from_millis(30));
    assert_eq!(timed.budget, Budget::Time(Duration::from_millis(30)));
}

#[test]
fn test_config_default_values() {
    // Test that default values are set correctly
    let config = MCTSConfig::default();

    // Default exploration constant should be sqrt(2)
    assert!((config.exploration_constant - 1.414).abs() < 0.001);
    assert_eq!(config.budget, Budget::Iterations(10_000));
    assert_eq!(config.selection_policy, SelectionPolicy::Ucb);
    assert_eq!(config.rollout_policy, RolloutPolicy::Random);
    assert_eq!(config.opponent_tree_policy, OpponentTreePolicy::OneTree);
    assert!(!config.paranoid);
    assert!(!config.reuse_tree);
    assert_eq!(config.best_child_criteria, BestChildCriteria::MostVisits);
    assert_eq!(config.seed, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_paranoid_requires_shared_tree() {
    for policy in [OpponentTreePolicy::SelfOnly, OpponentTreePolicy::MultiTree] {
        let config = MCTSConfig::default()
            .with_paranoid(true)
            .with_opponent_tree_policy(policy);
        assert!(matches!(
            config.validate(),
            Err(MCTSError::InvalidConfiguration(_))
        ));
    }

    let config = MCTSConfig::default().with_paranoid(true);
    assert!(config.validate().is_ok());
}

#[test]
fn test_tree_reuse_topologies() {
    let rejected = MCTSConfig::default()
        .with_reuse_tree(true)
        .with_opponent_tree_policy(OpponentTreePolicy::Mcgs);
    assert!(rejected.validate().is_err());

    let accepted = MCTSConfig::default()
        .with_reuse_tree(true)
        .with_opponent_tree_policy(OpponentTreePolicy::SelfOnly);
    assert!(accepted.validate().is_ok());
}

#[test]
fn test_out_of_range_parameters_are_rejected() {
    let bad = [
        MCTSConfig::default().with_exploration_constant(-1.0),
        MCTSConfig::default().with_exploration_constant(f64::NAN),
        MCTSConfig::default().with_gamma(1.5),
        MCTSConfig::default().with_oma_weight(-0.1),
        MCTSConfig::default().with_mast_gamma(2.0),
        MCTSConfig::default().with_boltzmann(0.0),
        MCTSConfig::default().with_mast(0.0, 0.0, 0.0),
        MCTSConfig::default().with_epsilon(1.0),
        MCTSConfig::default().with_mcgs_resolution(0.0),
        MCTSConfig::default().with_rollout_policy(RolloutPolicy::Heuristic { epsilon: 1.2 }),
    ];
    for config in bad {
        assert!(config.validate().is_err(), "accepted {:?}", config);
    }
}

#[test]
fn test_invalid_config_fails_at_construction() {
    let config = MCTSConfig::default()
        .with_paranoid(true)
        .with_opponent_tree_policy(OpponentTreePolicy::SelfOnly);
    let result = MCTS::new(Race::new(2, 10, 0), config);
    assert!(matches!(result, Err(MCTSError::InvalidConfiguration(_))));
}
