//! Information-set keys and the encoder that builds them from trajectories.
//!
//! A key holds exactly what the acting player has observed: its own seat,
//! its concealed holdings, every event in order with targets it was allowed
//! to see, and the decision phase. Hidden targets collapse to `?`, so two
//! histories that differ only in a card the player never saw produce the
//! same key.
//!
//! Canonical text form (used for persistence):
//!
//!   phase|seat|hand-bits-hex|p0.deal,p1.deal,p0.up:3s,p1.draw:?,...

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cards::{parse_card, CardSet};
use crate::error::{CfrError, CfrResult};
use crate::game::Player;
use crate::history::{Event, HistoryEntry, Observed};

/// Decision type. Action sets of different phases are sized independently,
/// so keys of different phases must never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Choose face-up discard or face-down stock.
    Draw,
    /// Knock or continue.
    Knock,
    /// Choose the card to discard.
    Discard,
    /// Single-decision-type games (bets, throws).
    Act,
}

impl Phase {
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Draw => "draw",
            Phase::Knock => "knock",
            Phase::Discard => "discard",
            Phase::Act => "act",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Phase> {
        match tag {
            "draw" => Some(Phase::Draw),
            "knock" => Some(Phase::Knock),
            "discard" => Some(Phase::Discard),
            "act" => Some(Phase::Act),
            _ => None,
        }
    }
}

/// One trajectory entry as the key owner saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeenEvent {
    pub player: Player,
    pub event: Event,
    pub target: Observed,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InfoSetKey {
    phase: Phase,
    player: Player,
    hand: CardSet,
    events: Box<[SeenEvent]>,
}

impl InfoSetKey {
    pub fn new(phase: Phase, player: Player, hand: CardSet, events: Vec<SeenEvent>) -> Self {
        InfoSetKey {
            phase,
            player,
            hand,
            events: events.into_boxed_slice(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn hand(&self) -> CardSet {
        self.hand
    }

    pub fn events(&self) -> &[SeenEvent] {
        &self.events
    }
}

impl fmt::Display for InfoSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{:013x}|", self.phase.tag(), self.player, self.hand.bits())?;
        for (i, seen) in self.events.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}.{}", seen.player, seen.event.tag())?;
            if seen.target != Observed::None {
                write!(f, ":{}", seen.target)?;
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> CfrError {
    CfrError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_player(s: &str, key: &str) -> CfrResult<Player> {
    s.strip_prefix('p')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(Player::from_index)
        .ok_or_else(|| invalid(key, format!("bad seat '{}'", s)))
}

fn parse_observed(s: &str, key: &str) -> CfrResult<Observed> {
    if s == "?" {
        return Ok(Observed::Hidden);
    }
    if let Some(slot) = s.strip_prefix('#') {
        return slot
            .parse::<u8>()
            .map(Observed::Slot)
            .map_err(|_| invalid(key, format!("bad slot '{}'", s)));
    }
    parse_card(s)
        .map(Observed::Card)
        .map_err(|e| invalid(key, e.to_string()))
}

impl FromStr for InfoSetKey {
    type Err = CfrError;

    fn from_str(s: &str) -> CfrResult<Self> {
        let parts: Vec<&str> = s.split('|').collect();
        let [phase, player, hand, events] = parts.as_slice() else {
            return Err(invalid(s, "expected 4 '|'-separated fields"));
        };

        let phase = Phase::from_tag(phase).ok_or_else(|| invalid(s, format!("bad phase '{}'", phase)))?;
        let player = parse_player(player, s)?;
        let bits = u64::from_str_radix(hand, 16).map_err(|_| invalid(s, format!("bad hand '{}'", hand)))?;
        let hand = CardSet::from_bits(bits);
        if hand.bits() != bits {
            return Err(invalid(s, "hand has bits outside the deck"));
        }

        let mut seen = Vec::new();
        if !events.is_empty() {
            for item in events.split(',') {
                let (head, target) = match item.split_once(':') {
                    Some((head, target)) => (head, parse_observed(target, s)?),
                    None => (item, Observed::None),
                };
                let (who, tag) = head
                    .split_once('.')
                    .ok_or_else(|| invalid(s, format!("bad event '{}'", item)))?;
                let event = Event::from_tag(tag).ok_or_else(|| invalid(s, format!("bad event tag '{}'", tag)))?;
                seen.push(SeenEvent {
                    player: parse_player(who, s)?,
                    event,
                    target,
                });
            }
        }

        Ok(InfoSetKey::new(phase, player, hand, seen))
    }
}

impl Serialize for InfoSetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InfoSetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Builds information-set keys from trajectories. Implementations must be
/// pure: the same trajectory, seat and phase always give the same key.
pub trait HistoryEncoder {
    fn encode(&self, trajectory: &[HistoryEntry], player: Player, phase: Phase) -> InfoSetKey;
}

/// Perfect-recall encoder: own holdings plus the full ordered event log
/// restricted to what `player` could see.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardGameEncoder;

impl HistoryEncoder for CardGameEncoder {
    fn encode(&self, trajectory: &[HistoryEntry], player: Player, phase: Phase) -> InfoSetKey {
        let hand = trajectory
            .iter()
            .rev()
            .find(|entry| entry.player == player)
            .map(|entry| entry.hand)
            .unwrap_or_default();

        let events = trajectory
            .iter()
            .map(|entry| SeenEvent {
                player: entry.player,
                event: entry.event,
                target: entry.observed_by(player),
            })
            .collect();

        InfoSetKey::new(phase, player, hand, events)
    }
}
