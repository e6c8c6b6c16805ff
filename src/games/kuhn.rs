//! Three-card Kuhn poker. Each player antes 1 and is dealt one of J, Q, K;
//! the first player's game value under equilibrium play is -1/18.

use std::fmt;

use crate::cards::{Card, CardSet, Rank, Suit};
use crate::game::{Game, Player};
use crate::history::{Event, HistoryEntry, Target, Trajectory};
use crate::infoset::Phase;

pub const KUHN_DECK: [Card; 3] = [
    Card { rank: Rank::Jack, suit: Suit::Spades },
    Card { rank: Rank::Queen, suit: Suit::Spades },
    Card { rank: Rank::King, suit: Suit::Spades },
];

/// Exact value of the game for the first player.
pub const GAME_VALUE: f64 = -1.0 / 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KuhnAction {
    Pass,
    Bet,
}

impl KuhnAction {
    fn slot(self) -> u8 {
        match self {
            KuhnAction::Pass => 0,
            KuhnAction::Bet => 1,
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "pass"),
            KuhnAction::Bet => write!(f, "bet"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KuhnState {
    cards: Option<[Card; 2]>,
    actions: Vec<KuhnAction>,
    trajectory: Trajectory,
}

impl KuhnState {
    pub fn cards(&self) -> Option<[Card; 2]> {
        self.cards
    }

    pub fn actions(&self) -> &[KuhnAction] {
        &self.actions
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Kuhn;

impl Kuhn {
    pub fn new() -> Self {
        Kuhn
    }

    fn deal(&self, first: Card, second: Card) -> KuhnState {
        let mut trajectory = Trajectory::new();
        for (player, card) in [(Player::First, first), (Player::Second, second)] {
            trajectory.push(HistoryEntry::private(
                player,
                Event::Deal,
                Target::None,
                CardSet::EMPTY.with(card),
            ));
        }
        KuhnState {
            cards: Some([first, second]),
            actions: Vec::new(),
            trajectory,
        }
    }

    /// (winner, pot share won) at a terminal state.
    fn outcome(&self, state: &KuhnState) -> Option<(Player, f64)> {
        use KuhnAction::*;
        let [c0, c1] = state.cards?;
        let showdown = if c0.rank > c1.rank { Player::First } else { Player::Second };
        match state.actions.as_slice() {
            [Pass, Pass] => Some((showdown, 1.0)),
            [Bet, Pass] => Some((Player::First, 1.0)),
            [Pass, Bet, Pass] => Some((Player::Second, 1.0)),
            [Bet, Bet] | [Pass, Bet, Bet] => Some((showdown, 2.0)),
            _ => None,
        }
    }
}

impl Game for Kuhn {
    type State = KuhnState;
    type Action = KuhnAction;

    fn initial_state(&self) -> KuhnState {
        KuhnState::default()
    }

    fn is_terminal(&self, state: &KuhnState) -> bool {
        self.outcome(state).is_some()
    }

    fn is_chance(&self, state: &KuhnState) -> bool {
        state.cards.is_none()
    }

    fn current_player(&self, state: &KuhnState) -> Player {
        if state.actions.len() % 2 == 0 {
            Player::First
        } else {
            Player::Second
        }
    }

    fn legal_actions(&self, _state: &KuhnState) -> Vec<KuhnAction> {
        vec![KuhnAction::Pass, KuhnAction::Bet]
    }

    fn apply_action(&self, state: &KuhnState, action: &KuhnAction) -> KuhnState {
        let player = self.current_player(state);
        let hand = state
            .cards
            .map(|cards| CardSet::EMPTY.with(cards[player.index()]))
            .unwrap_or_default();
        let mut next = state.clone();
        next.actions.push(*action);
        next.trajectory.push(HistoryEntry::public(
            player,
            Event::Choice,
            Target::Slot(action.slot()),
            hand,
        ));
        next
    }

    fn utility(&self, state: &KuhnState, player: Player) -> f64 {
        match self.outcome(state) {
            Some((winner, amount)) if winner == player => amount,
            Some((_, amount)) => -amount,
            None => 0.0,
        }
    }

    fn chance_outcomes(&self, _state: &KuhnState) -> Vec<(KuhnState, f64)> {
        let mut outcomes = Vec::with_capacity(6);
        for &first in &KUHN_DECK {
            for &second in KUHN_DECK.iter().filter(|&&c| c != first) {
                outcomes.push((self.deal(first, second), 1.0 / 6.0));
            }
        }
        outcomes
    }

    fn trajectory<'s>(&self, state: &'s KuhnState) -> &'s [HistoryEntry] {
        state.trajectory.entries()
    }

    fn phase(&self, _state: &KuhnState) -> Phase {
        Phase::Act
    }
}
