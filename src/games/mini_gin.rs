//! Reduced gin rummy over a short deck.
//!
//! Turn structure: draw (face-up discard or face-down stock), discard,
//! then, when the discarder's deadwood is at or below the knock threshold,
//! knock or continue. A knock ends the hand and scores deadwood against
//! deadwood; there is no laying off. The hand is void once `max_turns`
//! turns have been played or the stock runs out.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::cards::{short_deck, Card, CardSet};
use crate::error::{CfrError, CfrResult};
use crate::game::{Game, Player};
use crate::history::{Event, HistoryEntry, Target, Trajectory, Visibility};
use crate::infoset::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniGinConfig {
    /// Ranks used, ace upward.
    pub ranks: usize,
    pub suits: usize,
    pub hand_size: usize,
    pub knock_threshold: u32,
    pub max_turns: usize,
    pub gin_bonus: f64,
    pub undercut_bonus: f64,
}

impl Default for MiniGinConfig {
    fn default() -> Self {
        MiniGinConfig {
            ranks: 5,
            suits: 2,
            hand_size: 3,
            knock_threshold: 4,
            max_turns: 4,
            gin_bonus: 25.0,
            undercut_bonus: 25.0,
        }
    }
}

impl MiniGinConfig {
    pub fn deck_size(&self) -> usize {
        self.ranks * self.suits
    }

    pub fn validate(&self) -> CfrResult<()> {
        if !(1..=13).contains(&self.ranks) {
            return Err(CfrError::InvalidConfig(format!("ranks must be 1..=13, got {}", self.ranks)));
        }
        if !(1..=4).contains(&self.suits) {
            return Err(CfrError::InvalidConfig(format!("suits must be 1..=4, got {}", self.suits)));
        }
        if self.hand_size == 0 {
            return Err(CfrError::InvalidConfig("hand_size must be at least 1".to_string()));
        }
        // two hands, the up card and at least one stock card
        if self.deck_size() < 2 * self.hand_size + 2 {
            return Err(CfrError::InvalidConfig(format!(
                "a {}-card deck cannot deal two {}-card hands with a stock",
                self.deck_size(),
                self.hand_size
            )));
        }
        if self.max_turns == 0 {
            return Err(CfrError::InvalidConfig("max_turns must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GinAction {
    DrawFaceUp,
    DrawFaceDown,
    Discard(Card),
    Knock,
    Continue,
}

impl fmt::Display for GinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GinAction::DrawFaceUp => write!(f, "take up card"),
            GinAction::DrawFaceDown => write!(f, "draw from stock"),
            GinAction::Discard(card) => write!(f, "discard {}", card),
            GinAction::Knock => write!(f, "knock"),
            GinAction::Continue => write!(f, "continue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    Knocked(Player),
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    DealHand(Player),
    TurnUp,
    Draw,
    StockDraw,
    /// A card just taken face up may not be thrown straight back.
    Discard { taken_up: Option<Card> },
    Knock,
    Over(Ending),
}

#[derive(Debug, Clone)]
pub struct MiniGinState {
    stage: Stage,
    to_act: Player,
    hands: [CardSet; 2],
    stock: CardSet,
    discards: Vec<Card>,
    turns: usize,
    trajectory: Trajectory,
}

impl MiniGinState {
    pub fn hand(&self, player: Player) -> CardSet {
        self.hands[player.index()]
    }

    pub fn up_card(&self) -> Option<Card> {
        self.discards.last().copied()
    }

    pub fn stock_len(&self) -> usize {
        self.stock.len()
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn ending(&self) -> Option<Ending> {
        match self.stage {
            Stage::Over(ending) => Some(ending),
            _ => None,
        }
    }

    fn record(&mut self, visibility: Visibility, event: Event, target: Target) {
        self.trajectory.push(HistoryEntry {
            hand: self.hand(self.to_act),
            event,
            target,
            player: self.to_act,
            visibility,
        });
    }
}

/// Every set (three or four cards of one rank) and run (three or more
/// consecutive ranks of one suit) inside `hand`. Overlapping melds are all
/// listed.
pub fn melds(hand: CardSet) -> Vec<CardSet> {
    let cards = hand.to_vec();
    let mut melds = Vec::new();

    let by_rank = cards.iter().copied().sorted_by_key(|c| c.rank).chunk_by(|c| c.rank);
    for (_, group) in &by_rank {
        let group: Vec<Card> = group.collect();
        for size in 3..=group.len() {
            melds.extend(
                group
                    .iter()
                    .copied()
                    .combinations(size)
                    .map(|combo| combo.into_iter().collect::<CardSet>()),
            );
        }
    }

    let by_suit = cards
        .iter()
        .copied()
        .sorted_by_key(|c| (c.suit, c.rank))
        .chunk_by(|c| c.suit);
    for (_, suited) in &by_suit {
        let suited: Vec<Card> = suited.collect();
        for start in 0..suited.len() {
            let mut end = start + 1;
            while end < suited.len() && suited[end].rank.value() == suited[end - 1].rank.value() + 1 {
                end += 1;
            }
            for stop in (start + 3)..=end {
                melds.push(suited[start..stop].iter().copied().collect());
            }
        }
    }

    melds
}

fn points(cards: CardSet) -> u32 {
    cards.iter().map(|c| c.deadwood()).sum()
}

fn least_deadwood(remaining: CardSet, melds: &[CardSet]) -> u32 {
    let mut best = points(remaining);
    for (i, meld) in melds.iter().enumerate() {
        if remaining.contains_all(*meld) {
            best = best.min(least_deadwood(remaining.difference(*meld), &melds[i + 1..]));
        }
    }
    best
}

/// Deadwood of `hand` under its best arrangement of disjoint melds.
pub fn deadwood(hand: CardSet) -> u32 {
    least_deadwood(hand, &melds(hand))
}

#[derive(Debug, Clone)]
pub struct MiniGin {
    config: MiniGinConfig,
    deck: CardSet,
}

impl MiniGin {
    pub fn new(config: MiniGinConfig) -> CfrResult<Self> {
        config.validate()?;
        let deck = short_deck(config.ranks, config.suits).into_iter().collect();
        Ok(MiniGin { config, deck })
    }

    pub fn config(&self) -> &MiniGinConfig {
        &self.config
    }

    /// Points won by the knocker (negative when undercut).
    pub fn knock_score(&self, knocker: CardSet, opponent: CardSet) -> f64 {
        let dk = deadwood(knocker) as f64;
        let dopp = deadwood(opponent) as f64;
        if dk == 0.0 {
            dopp + self.config.gin_bonus
        } else if dk < dopp {
            dopp - dk
        } else {
            -(dk - dopp + self.config.undercut_bonus)
        }
    }

    fn end_turn(&self, state: &mut MiniGinState) {
        state.turns += 1;
        if state.turns >= self.config.max_turns || state.stock.is_empty() {
            state.stage = Stage::Over(Ending::Void);
        } else {
            state.to_act = state.to_act.opponent();
            state.stage = Stage::Draw;
        }
    }

    fn after_discard(&self, state: &mut MiniGinState) {
        if deadwood(state.hand(state.to_act)) <= self.config.knock_threshold {
            state.stage = Stage::Knock;
        } else {
            self.end_turn(state);
        }
    }

    fn deal_hand(&self, state: &MiniGinState, player: Player) -> Vec<MiniGinState> {
        state
            .stock
            .iter()
            .combinations(self.config.hand_size)
            .map(|combo| {
                let hand: CardSet = combo.into_iter().collect();
                let mut next = state.clone();
                next.hands[player.index()] = hand;
                next.stock = state.stock.difference(hand);
                next.to_act = player;
                next.record(Visibility::Private, Event::Deal, Target::None);
                next.stage = match player {
                    Player::First => Stage::DealHand(Player::Second),
                    Player::Second => Stage::TurnUp,
                };
                next
            })
            .collect()
    }

    fn turn_up(&self, state: &MiniGinState) -> Vec<MiniGinState> {
        state
            .stock
            .iter()
            .map(|card| {
                let mut next = state.clone();
                next.stock.remove(card);
                next.discards.push(card);
                next.to_act = Player::First;
                next.record(Visibility::Public, Event::TurnUp, Target::Card(card));
                next.stage = Stage::Draw;
                next
            })
            .collect()
    }

    fn stock_draw(&self, state: &MiniGinState) -> Vec<MiniGinState> {
        let player = state.to_act;
        state
            .stock
            .iter()
            .map(|card| {
                let mut next = state.clone();
                next.stock.remove(card);
                next.hands[player.index()].insert(card);
                next.record(Visibility::Private, Event::DrawFaceDown, Target::Card(card));
                next.stage = Stage::Discard { taken_up: None };
                next
            })
            .collect()
    }
}

impl Game for MiniGin {
    type State = MiniGinState;
    type Action = GinAction;

    fn initial_state(&self) -> MiniGinState {
        MiniGinState {
            stage: Stage::DealHand(Player::First),
            to_act: Player::First,
            hands: [CardSet::EMPTY; 2],
            stock: self.deck,
            discards: Vec::new(),
            turns: 0,
            trajectory: Trajectory::new(),
        }
    }

    fn is_terminal(&self, state: &MiniGinState) -> bool {
        matches!(state.stage, Stage::Over(_))
    }

    fn is_chance(&self, state: &MiniGinState) -> bool {
        matches!(state.stage, Stage::DealHand(_) | Stage::TurnUp | Stage::StockDraw)
    }

    fn current_player(&self, state: &MiniGinState) -> Player {
        state.to_act
    }

    fn legal_actions(&self, state: &MiniGinState) -> Vec<GinAction> {
        match state.stage {
            Stage::Draw => {
                let mut actions = Vec::with_capacity(2);
                if !state.discards.is_empty() {
                    actions.push(GinAction::DrawFaceUp);
                }
                if !state.stock.is_empty() {
                    actions.push(GinAction::DrawFaceDown);
                }
                actions
            }
            Stage::Discard { taken_up } => state
                .hand(state.to_act)
                .iter()
                .filter(|&card| Some(card) != taken_up)
                .map(GinAction::Discard)
                .collect(),
            Stage::Knock => vec![GinAction::Knock, GinAction::Continue],
            _ => Vec::new(),
        }
    }

    /// Actions that are not legal in `state` leave it unchanged.
    fn apply_action(&self, state: &MiniGinState, action: &GinAction) -> MiniGinState {
        let mut next = state.clone();
        let p = state.to_act.index();
        match (state.stage, *action) {
            (Stage::Draw, GinAction::DrawFaceUp) => {
                if let Some(card) = next.discards.pop() {
                    next.hands[p].insert(card);
                    next.record(Visibility::Public, Event::DrawFaceUp, Target::Card(card));
                    next.stage = Stage::Discard { taken_up: Some(card) };
                }
            }
            (Stage::Draw, GinAction::DrawFaceDown) => {
                next.stage = Stage::StockDraw;
            }
            (Stage::Discard { taken_up }, GinAction::Discard(card))
                if state.hands[p].contains(card) && Some(card) != taken_up =>
            {
                next.hands[p].remove(card);
                next.discards.push(card);
                next.record(Visibility::Public, Event::Discard, Target::Card(card));
                self.after_discard(&mut next);
            }
            (Stage::Knock, GinAction::Knock) => {
                next.record(Visibility::Public, Event::Knock, Target::None);
                next.stage = Stage::Over(Ending::Knocked(state.to_act));
            }
            (Stage::Knock, GinAction::Continue) => {
                next.record(Visibility::Public, Event::Continue, Target::None);
                self.end_turn(&mut next);
            }
            _ => {}
        }
        next
    }

    fn utility(&self, state: &MiniGinState, player: Player) -> f64 {
        match state.stage {
            Stage::Over(Ending::Knocked(knocker)) => {
                let score = self.knock_score(state.hand(knocker), state.hand(knocker.opponent()));
                if player == knocker {
                    score
                } else {
                    -score
                }
            }
            _ => 0.0,
        }
    }

    fn chance_outcomes(&self, state: &MiniGinState) -> Vec<(MiniGinState, f64)> {
        let outcomes = match state.stage {
            Stage::DealHand(player) => self.deal_hand(state, player),
            Stage::TurnUp => self.turn_up(state),
            Stage::StockDraw => self.stock_draw(state),
            _ => Vec::new(),
        };
        let p = 1.0 / outcomes.len().max(1) as f64;
        outcomes.into_iter().map(|s| (s, p)).collect()
    }

    fn trajectory<'s>(&self, state: &'s MiniGinState) -> &'s [HistoryEntry] {
        state.trajectory.entries()
    }

    fn phase(&self, state: &MiniGinState) -> Phase {
        match state.stage {
            Stage::Draw => Phase::Draw,
            Stage::Discard { .. } => Phase::Discard,
            Stage::Knock => Phase::Knock,
            _ => Phase::Act,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn set(notation: &str) -> CardSet {
        parse_cards(notation).unwrap().into_iter().collect()
    }

    #[test]
    fn finds_sets_and_runs() {
        assert_eq!(melds(set("As Ah Ad")).len(), 1);
        assert_eq!(melds(set("As Ah Ad Ac")).len(), 5);
        assert_eq!(melds(set("As 2s 3s 4s")).len(), 3);
        assert!(melds(set("As 2s 3h")).is_empty());
    }

    #[test]
    fn deadwood_uses_best_arrangement() {
        assert_eq!(deadwood(set("As 2s 3s")), 0);
        assert_eq!(deadwood(set("As 2s 3s 5h")), 5);
        // 3s joins either the run or the set of threes
        assert_eq!(deadwood(set("As 2s 3s 3h 3d")), 3);
        assert_eq!(deadwood(set("Ks Qh")), 20);
    }

    #[test]
    fn default_deal_counts() {
        let game = MiniGin::new(MiniGinConfig::default()).unwrap();
        let root = game.initial_state();
        let hands0 = game.chance_outcomes(&root);
        assert_eq!(hands0.len(), 120);
        let hands1 = game.chance_outcomes(&hands0[0].0);
        assert_eq!(hands1.len(), 35);
        let ups = game.chance_outcomes(&hands1[0].0);
        assert_eq!(ups.len(), 4);
        let (dealt, _) = &ups[0];
        assert!(!game.is_chance(dealt));
        assert_eq!(game.phase(dealt), Phase::Draw);
        assert_eq!(dealt.stock_len(), 3);
    }

    #[test]
    fn face_up_card_cannot_be_thrown_back() {
        let game = MiniGin::new(MiniGinConfig::default()).unwrap();
        let mut state = game.initial_state();
        while game.is_chance(&state) {
            state = game.chance_outcomes(&state).swap_remove(0).0;
        }
        let up = state.up_card().unwrap();
        let state = game.apply_action(&state, &GinAction::DrawFaceUp);
        let actions = game.legal_actions(&state);
        assert_eq!(actions.len(), 3);
        assert!(!actions.contains(&GinAction::Discard(up)));
    }

    #[test]
    fn knock_scoring() {
        let game = MiniGin::new(MiniGinConfig::default()).unwrap();
        assert_eq!(game.knock_score(set("As 2s 3s"), set("4h 5h")), 9.0 + 25.0);
        assert_eq!(game.knock_score(set("As 2h"), set("4h 5h")), 6.0);
        assert_eq!(game.knock_score(set("3s 2h"), set("Ah 4h")), -25.0);
    }

    #[test]
    fn bad_config_rejected() {
        let config = MiniGinConfig {
            ranks: 2,
            suits: 2,
            ..MiniGinConfig::default()
        };
        assert!(MiniGin::new(config).is_err());
    }
}
