//! Trajectory records: what happened in a game instance, and who saw it.

use std::fmt;

use crate::cards::{Card, CardSet};
use crate::game::Player;

/// Kind of event recorded in a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    /// Cards dealt to `player`.
    Deal,
    /// Initial face-up card turned from the stock.
    TurnUp,
    DrawFaceUp,
    DrawFaceDown,
    Discard,
    Knock,
    /// Declined to knock.
    Continue,
    /// A decision with no card attached (bets, throws).
    Choice,
}

impl Event {
    pub fn tag(self) -> &'static str {
        match self {
            Event::Deal => "deal",
            Event::TurnUp => "up",
            Event::DrawFaceUp => "take",
            Event::DrawFaceDown => "draw",
            Event::Discard => "discard",
            Event::Knock => "knock",
            Event::Continue => "continue",
            Event::Choice => "choice",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Event> {
        match tag {
            "deal" => Some(Event::Deal),
            "up" => Some(Event::TurnUp),
            "take" => Some(Event::DrawFaceUp),
            "draw" => Some(Event::DrawFaceDown),
            "discard" => Some(Event::Discard),
            "knock" => Some(Event::Knock),
            "continue" => Some(Event::Continue),
            "choice" => Some(Event::Choice),
            _ => None,
        }
    }
}

/// What an event acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    None,
    Card(Card),
    Slot(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Both players see the event and its target.
    Public,
    /// Both players see the event; only the actor sees its target.
    Private,
}

/// A target as seen by one particular player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Observed {
    None,
    Card(Card),
    Slot(u8),
    Hidden,
}

impl From<Target> for Observed {
    fn from(target: Target) -> Self {
        match target {
            Target::None => Observed::None,
            Target::Card(card) => Observed::Card(card),
            Target::Slot(slot) => Observed::Slot(slot),
        }
    }
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::None => Ok(()),
            Observed::Card(card) => write!(f, "{}", card),
            Observed::Slot(slot) => write!(f, "#{}", slot),
            Observed::Hidden => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Actor's concealed holdings right after the event.
    pub hand: CardSet,
    pub event: Event,
    pub target: Target,
    pub player: Player,
    pub visibility: Visibility,
}

impl HistoryEntry {
    pub fn public(player: Player, event: Event, target: Target, hand: CardSet) -> Self {
        HistoryEntry {
            hand,
            event,
            target,
            player,
            visibility: Visibility::Public,
        }
    }

    pub fn private(player: Player, event: Event, target: Target, hand: CardSet) -> Self {
        HistoryEntry {
            hand,
            event,
            target,
            player,
            visibility: Visibility::Private,
        }
    }

    /// The target as `viewer` observed it.
    pub fn observed_by(&self, viewer: Player) -> Observed {
        match self.target {
            Target::None => Observed::None,
            target if self.visibility == Visibility::Public || self.player == viewer => {
                target.into()
            }
            _ => Observed::Hidden,
        }
    }
}

/// Append-only log of one game instance. A new game starts from a new (or
/// cleared) trajectory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trajectory {
    entries: Vec<HistoryEntry>,
}

impl Trajectory {
    pub fn new() -> Self {
        Trajectory::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
