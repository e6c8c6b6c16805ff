//! Small rules engines implementing `Game`.

pub mod kuhn;
pub mod mini_gin;
pub mod rps;

use std::fmt;
use std::str::FromStr;

use crate::error::CfrError;

pub use kuhn::{Kuhn, KuhnAction};
pub use mini_gin::{GinAction, MiniGin, MiniGinConfig};
pub use rps::{Rps, Throw};

/// Game selector for the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Rps,
    Kuhn,
    MiniGin,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Rps, GameKind::Kuhn, GameKind::MiniGin];

    pub fn name(self) -> &'static str {
        match self {
            GameKind::Rps => "rps",
            GameKind::Kuhn => "kuhn",
            GameKind::MiniGin => "mini-gin",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameKind {
    type Err = CfrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| CfrError::UnknownGame(s.to_string()))
    }
}
