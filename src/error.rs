use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfrError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid information-set key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Abstraction mismatch at {key}: stored node has {stored} actions, caller has {requested}")]
    AbstractionMismatch {
        key: String,
        stored: usize,
        requested: usize,
    },

    #[error("Sampled action index {index} is outside the {legal} legal actions")]
    IllegalSample { index: usize, legal: usize },

    #[error("Malformed strategy table row {row}: {reason}")]
    MalformedTable { row: usize, reason: String },

    #[error("Tree walk exceeded the recursion budget of {0}")]
    DepthExceeded(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown game: {0}")]
    UnknownGame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type CfrResult<T> = Result<T, CfrError>;
