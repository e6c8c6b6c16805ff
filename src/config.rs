//! Training configuration: what the command line (or a JSON file) hands
//! to the trainer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CfrError, CfrResult};

/// How chance nodes are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Enumerate every outcome, weighted by its probability.
    Exact,
    /// Sample one outcome per visit (chance-sampled Monte-Carlo CFR).
    Sampled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub iterations: usize,
    pub seed: u64,
    pub traversal: Traversal,
    /// Worker threads for batched self-play. 1 = single-threaded reference run.
    pub threads: usize,
    /// Iterations walked against one frozen strategy profile before the
    /// deltas are applied.
    pub batch_size: usize,
    /// Recursion budget for one walk.
    pub max_depth: usize,
    /// Where the trained table is written, if anywhere.
    pub table_path: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            iterations: 10_000,
            seed: 7,
            traversal: Traversal::Exact,
            threads: 1,
            batch_size: 1,
            max_depth: 512,
            table_path: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> CfrResult<()> {
        if self.threads == 0 {
            return Err(CfrError::InvalidConfig("threads must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(CfrError::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(CfrError::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> CfrResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: TrainerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TrainerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threads_rejected() {
        let config = TrainerConfig {
            threads: 0,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(CfrError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: TrainerConfig =
            serde_json::from_str(r#"{ "iterations": 50, "traversal": "sampled" }"#).unwrap();
        assert_eq!(config.iterations, 50);
        assert_eq!(config.traversal, Traversal::Sampled);
        assert_eq!(config.seed, TrainerConfig::default().seed);
        assert_eq!(config.table_path, None);
    }
}
