//! Rules-engine boundary consumed by the trainer, the evaluator and the
//! policy player.
//!
//! A `Game` is a pure description of an extensive-form tree: states are
//! values, `apply_action` returns a new state and never mutates its input.

use std::fmt;

use crate::history::HistoryEntry;
use crate::infoset::Phase;

/// One of the two seats in a zero-sum game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Player {
    First,
    Second,
}

pub const PLAYERS: [Player; 2] = [Player::First, Player::Second];

impl Player {
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Player> {
        match index {
            0 => Some(Player::First),
            1 => Some(Player::Second),
            _ => None,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.index())
    }
}

pub trait Game {
    type State: Clone;
    type Action: Clone + PartialEq + fmt::Debug;

    /// Root of the tree. Usually a chance node that deals.
    fn initial_state(&self) -> Self::State;

    fn is_terminal(&self, state: &Self::State) -> bool;

    fn is_chance(&self, state: &Self::State) -> bool;

    /// Seat to act at a decision node.
    fn current_player(&self, state: &Self::State) -> Player;

    /// Ordered legal actions at a decision node. The order fixes the action
    /// indices stored in the strategy table.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Payoff at a terminal state. `utility(s, First) == -utility(s, Second)`.
    fn utility(&self, state: &Self::State, player: Player) -> f64;

    /// Successor states of a chance node with their probabilities.
    fn chance_outcomes(&self, state: &Self::State) -> Vec<(Self::State, f64)>;

    /// Everything that happened so far in this game instance.
    fn trajectory<'s>(&self, state: &'s Self::State) -> &'s [HistoryEntry];

    /// Decision type at a decision node.
    fn phase(&self, state: &Self::State) -> Phase;

    fn utilities(&self, state: &Self::State) -> [f64; 2] {
        [
            self.utility(state, Player::First),
            self.utility(state, Player::Second),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_involution() {
        for p in PLAYERS {
            assert_eq!(p.opponent().opponent(), p);
            assert_ne!(p.opponent(), p);
            assert_eq!(Player::from_index(p.index()), Some(p));
        }
        assert_eq!(Player::from_index(2), None);
    }
}
