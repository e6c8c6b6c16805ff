//! Rock/paper/scissors as a two-move extensive-form game: the second
//! player throws without seeing the first throw.

use crate::cards::CardSet;
use crate::game::{Game, Player};
use crate::history::{Event, HistoryEntry, Target, Trajectory};
use crate::infoset::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throw {
    Rock,
    Paper,
    Scissors,
}

pub const THROWS: [Throw; 3] = [Throw::Rock, Throw::Paper, Throw::Scissors];

impl Throw {
    pub fn index(self) -> usize {
        self as usize
    }

    /// +1 if `self` beats `other`, -1 if it loses, 0 on a tie.
    pub fn payoff(self, other: Throw) -> f64 {
        match (3 + self.index() - other.index()) % 3 {
            0 => 0.0,
            1 => 1.0,
            _ => -1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RpsState {
    throws: [Option<Throw>; 2],
    trajectory: Trajectory,
}

impl RpsState {
    fn with_throw(&self, player: Player, throw: Throw) -> Self {
        let mut next = self.clone();
        next.throws[player.index()] = Some(throw);
        next.trajectory.push(HistoryEntry::private(
            player,
            Event::Choice,
            Target::Slot(throw.index() as u8),
            CardSet::EMPTY,
        ));
        next
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rps {
    /// When set, the second player is not a learner but throws with these
    /// fixed probabilities (a chance node).
    fixed_opponent: Option<[f64; 3]>,
}

impl Rps {
    /// Both seats learn.
    pub fn new() -> Self {
        Rps::default()
    }

    /// The second seat plays `strategy` forever.
    pub fn against(strategy: [f64; 3]) -> Self {
        Rps {
            fixed_opponent: Some(strategy),
        }
    }
}

impl Game for Rps {
    type State = RpsState;
    type Action = Throw;

    fn initial_state(&self) -> RpsState {
        RpsState::default()
    }

    fn is_terminal(&self, state: &RpsState) -> bool {
        state.throws.iter().all(Option::is_some)
    }

    fn is_chance(&self, state: &RpsState) -> bool {
        self.fixed_opponent.is_some() && state.throws[0].is_some() && state.throws[1].is_none()
    }

    fn current_player(&self, state: &RpsState) -> Player {
        if state.throws[0].is_none() {
            Player::First
        } else {
            Player::Second
        }
    }

    fn legal_actions(&self, _state: &RpsState) -> Vec<Throw> {
        THROWS.to_vec()
    }

    fn apply_action(&self, state: &RpsState, action: &Throw) -> RpsState {
        state.with_throw(self.current_player(state), *action)
    }

    fn utility(&self, state: &RpsState, player: Player) -> f64 {
        match state.throws {
            [Some(first), Some(second)] => {
                let u = first.payoff(second);
                match player {
                    Player::First => u,
                    Player::Second => -u,
                }
            }
            _ => 0.0,
        }
    }

    fn chance_outcomes(&self, state: &RpsState) -> Vec<(RpsState, f64)> {
        let Some(strategy) = self.fixed_opponent else {
            return Vec::new();
        };
        THROWS
            .iter()
            .zip(strategy)
            .filter(|(_, p)| *p > 0.0)
            .map(|(&throw, p)| (state.with_throw(Player::Second, throw), p))
            .collect()
    }

    fn trajectory<'s>(&self, state: &'s RpsState) -> &'s [HistoryEntry] {
        state.trajectory.entries()
    }

    fn phase(&self, _state: &RpsState) -> Phase {
        Phase::Act
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payoff_is_cyclic() {
        assert_eq!(Throw::Paper.payoff(Throw::Rock), 1.0);
        assert_eq!(Throw::Scissors.payoff(Throw::Paper), 1.0);
        assert_eq!(Throw::Rock.payoff(Throw::Scissors), 1.0);
        assert_eq!(Throw::Rock.payoff(Throw::Paper), -1.0);
        assert_eq!(Throw::Rock.payoff(Throw::Rock), 0.0);
    }

    #[test]
    fn fixed_opponent_is_chance() {
        let game = Rps::against([0.4, 0.3, 0.3]);
        let after = game.apply_action(&game.initial_state(), &Throw::Rock);
        assert!(game.is_chance(&after));
        let outcomes = game.chance_outcomes(&after);
        assert_eq!(outcomes.len(), 3);
        let total: f64 = outcomes.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_sum_at_terminals() {
        let game = Rps::new();
        for a in THROWS {
            for b in THROWS {
                let s = game.apply_action(&game.apply_action(&game.initial_state(), &a), &b);
                assert!(game.is_terminal(&s));
                assert_eq!(game.utility(&s, Player::First), -game.utility(&s, Player::Second));
            }
        }
    }
}
