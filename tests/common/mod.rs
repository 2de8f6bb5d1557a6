//! Small games shared by the integration tests
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use multiplayer_mcts::{Action, ForwardModelError, GameState};
use rand::RngCore;

// Simple tic-tac-toe implementation for testing
#[derive(Clone, Debug)]
pub struct TicTacToe {
    pub board: [Option<usize>; 9],
    pub to_move: usize,
    pub moves_played: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TicTacMove {
    pub position: usize,
}

impl Action for TicTacMove {
    fn id(&self) -> usize {
        self.position
    }
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

impl TicTacToe {
    pub fn new() -> Self {
        TicTacToe {
            board: [None; 9],
            to_move: 0,
            moves_played: 0,
        }
    }

    /// Builds a position from a 9-character string of `X`, `O` and `-`
    pub fn from_board(layout: &str, to_move: usize) -> Self {
        let mut state = TicTacToe::new();
        for (i, c) in layout.chars().enumerate() {
            state.board[i] = match c {
                'X' => Some(0),
                'O' => Some(1),
                _ => None,
            };
        }
        state.moves_played = state.board.iter().flatten().count();
        state.to_move = to_move;
        state
    }

    pub fn winner(&self) -> Option<usize> {
        LINES.iter().find_map(|line| {
            let first = self.board[line[0]]?;
            if line.iter().all(|&i| self.board[i] == Some(first)) {
                Some(first)
            } else {
                None
            }
        })
    }
}

impl GameState for TicTacToe {
    type Action = TicTacMove;

    fn num_players(&self) -> usize {
        2
    }

    fn current_player(&self) -> usize {
        self.to_move
    }

    fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.moves_played == 9
    }

    fn legal_actions(&self) -> Vec<TicTacMove> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..9)
            .filter(|&i| self.board[i].is_none())
            .map(|position| TicTacMove { position })
            .collect()
    }

    fn apply_action(&mut self, action: &TicTacMove) -> Result<(), ForwardModelError> {
        if self.board[action.position].is_some() {
            return Err(ForwardModelError::new(format!(
                "square {} is occupied",
                action.position
            )));
        }
        self.board[action.position] = Some(self.to_move);
        self.moves_played += 1;
        self.to_move = 1 - self.to_move;
        Ok(())
    }

    fn score(&self, player: usize) -> f64 {
        match self.winner() {
            Some(w) if w == player => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }

    fn feature_vector(&self, _player: usize) -> Option<Vec<f64>> {
        Some(
            self.board
                .iter()
                .map(|cell| match cell {
                    Some(p) => *p as f64 + 1.0,
                    None => 0.0,
                })
                .collect(),
        )
    }
}

/// Players take turns adding 1 or 2 to a total; whoever reaches the target wins
#[derive(Clone, Debug)]
pub struct Race {
    pub players: usize,
    pub target: u32,
    pub total: u32,
    pub to_move: usize,
    pub winner: Option<usize>,
}

impl Race {
    pub fn new(players: usize, target: u32, total: u32) -> Self {
        Race {
            players,
            target,
            total,
            to_move: 0,
            winner: None,
        }
    }
}

impl GameState for Race {
    type Action = u32;

    fn num_players(&self) -> usize {
        self.players
    }

    fn current_player(&self) -> usize {
        self.to_move
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    fn legal_actions(&self) -> Vec<u32> {
        if self.is_terminal() {
            Vec::new()
        } else {
            vec![1, 2]
        }
    }

    fn apply_action(&mut self, action: &u32) -> Result<(), ForwardModelError> {
        self.total += action;
        if self.total >= self.target {
            self.winner = Some(self.to_move);
        }
        self.to_move = (self.to_move + 1) % self.players;
        Ok(())
    }

    fn score(&self, player: usize) -> f64 {
        match self.winner {
            Some(w) if w == player => 1.0,
            _ => 0.0,
        }
    }

    fn heuristic(&self, _player: usize) -> f64 {
        0.5
    }

    fn feature_vector(&self, player: usize) -> Option<Vec<f64>> {
        Some(vec![self.total as f64, player as f64])
    }
}

/// Player 0 picks `picks` distinct items; each item has a fixed value
///
/// Every other player exists only in the outcome vector and never acts.
/// The feature vector is the set of picked items, so picking the same items
/// in a different order reaches the same key.
#[derive(Clone, Debug)]
pub struct PickItems {
    pub players: usize,
    pub values: Vec<f64>,
    pub picked: Vec<bool>,
    pub picks_left: usize,
}

impl PickItems {
    pub fn new(players: usize, values: Vec<f64>, picks: usize) -> Self {
        let picked = vec![false; values.len()];
        PickItems {
            players,
            values,
            picked,
            picks_left: picks,
        }
    }
}

impl GameState for PickItems {
    type Action = usize;

    fn num_players(&self) -> usize {
        self.players
    }

    fn current_player(&self) -> usize {
        0
    }

    fn is_terminal(&self) -> bool {
        self.picks_left == 0
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..self.values.len()).filter(|&i| !self.picked[i]).collect()
    }

    fn apply_action(&mut self, action: &usize) -> Result<(), ForwardModelError> {
        if self.picked[*action] {
            return Err(ForwardModelError::new("item already picked"));
        }
        self.picked[*action] = true;
        self.picks_left -= 1;
        Ok(())
    }

    fn score(&self, player: usize) -> f64 {
        let total: f64 = self
            .values
            .iter()
            .zip(&self.picked)
            .filter(|(_, &p)| p)
            .map(|(v, _)| v)
            .sum();
        if player == 0 {
            total
        } else {
            -total
        }
    }

    fn feature_vector(&self, _player: usize) -> Option<Vec<f64>> {
        Some(
            self.picked
                .iter()
                .map(|&p| if p { 1.0 } else { 0.0 })
                .collect(),
        )
    }
}

/// A one-shot guessing game whose hidden answer is only fixed by determinization
///
/// Each call to `determinize` takes the next answer from `answers`, so a
/// sequential perfect-information search sees the worlds in order.
#[derive(Clone, Debug)]
pub struct HiddenAnswer {
    pub answers: Vec<usize>,
    pub next_world: Arc<AtomicUsize>,
    pub answer: Option<usize>,
    pub guessed: Option<usize>,
}

impl HiddenAnswer {
    pub fn new(answers: Vec<usize>) -> Self {
        HiddenAnswer {
            answers,
            next_world: Arc::new(AtomicUsize::new(0)),
            answer: None,
            guessed: None,
        }
    }
}

impl GameState for HiddenAnswer {
    type Action = usize;

    fn num_players(&self) -> usize {
        1
    }

    fn current_player(&self) -> usize {
        0
    }

    fn is_terminal(&self) -> bool {
        self.guessed.is_some()
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            Vec::new()
        } else {
            vec![0, 1]
        }
    }

    fn apply_action(&mut self, action: &usize) -> Result<(), ForwardModelError> {
        self.guessed = Some(*action);
        Ok(())
    }

    fn score(&self, _player: usize) -> f64 {
        if self.guessed.is_some() && self.guessed == self.answer {
            1.0
        } else {
            0.0
        }
    }

    fn determinize(&self, _observer: usize, _rng: &mut dyn RngCore) -> Self {
        let world = self.next_world.fetch_add(1, Ordering::SeqCst);
        let mut sampled = self.clone();
        sampled.answer = self.answers.get(world % self.answers.len()).copied();
        sampled
    }
}
