//! Information-set store: one node of accumulated regret and strategy
//! weight per information set, created lazily on first visit.
//!
//! The store is an ordinary owned value. Training mutates it through
//! `apply`; match play only ever borrows it immutably.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::accumulator::DeltaAccumulator;
use crate::error::{CfrError, CfrResult};
use crate::infoset::InfoSetKey;
use crate::regret;

/// One information set's accumulated data.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSetNode {
    action_count: usize,
    /// Cumulative regret per action, floored at 0 (regret matching+).
    regret_sum: Vec<f64>,
    /// Cumulative reach-weighted strategy per action.
    strategy_sum: Vec<f64>,
}

impl InfoSetNode {
    pub fn new(action_count: usize) -> Self {
        InfoSetNode {
            action_count,
            regret_sum: vec![0.0; action_count],
            strategy_sum: vec![0.0; action_count],
        }
    }

    fn from_sums(regret_sum: Vec<f64>, strategy_sum: Vec<f64>) -> Self {
        InfoSetNode {
            action_count: regret_sum.len(),
            regret_sum,
            strategy_sum,
        }
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn regret_sum(&self) -> &[f64] {
        &self.regret_sum
    }

    pub fn strategy_sum(&self) -> &[f64] {
        &self.strategy_sum
    }

    pub fn current_strategy(&self) -> Vec<f64> {
        regret::current_strategy(self)
    }

    pub fn average_strategy(&self) -> Vec<f64> {
        regret::average_strategy(self)
    }

    /// Add regret and floor the cumulative value at 0.
    pub fn add_regret(&mut self, regret: &[f64]) {
        for (sum, &r) in self.regret_sum.iter_mut().zip(regret) {
            *sum = (*sum + r).max(0.0);
        }
    }

    /// `strategy_sum[a] += reach_weight * strategy[a]`.
    pub fn accumulate(&mut self, strategy: &[f64], reach_weight: f64) {
        regret::accumulate(&mut self.strategy_sum, strategy, reach_weight);
    }

    pub fn add_strategy_weight(&mut self, weight: &[f64]) {
        for (sum, &w) in self.strategy_sum.iter_mut().zip(weight) {
            *sum += w;
        }
    }
}

fn mismatch(key: &InfoSetKey, stored: usize, requested: usize) -> CfrError {
    CfrError::AbstractionMismatch {
        key: key.to_string(),
        stored,
        requested,
    }
}

#[derive(Debug, Clone, Default)]
pub struct InfoSetStore {
    nodes: HashMap<InfoSetKey, InfoSetNode>,
    /// Training iterations absorbed so far; a resumed run starts here.
    iterations: usize,
}

impl InfoSetStore {
    pub fn new() -> Self {
        InfoSetStore::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    /// `None` means the information set was never visited.
    pub fn get(&self, key: &InfoSetKey) -> Option<&InfoSetNode> {
        self.nodes.get(key)
    }

    /// Like `get`, but a node whose action count differs from the caller's
    /// is an error rather than a hit.
    pub fn lookup(&self, key: &InfoSetKey, action_count: usize) -> CfrResult<Option<&InfoSetNode>> {
        match self.nodes.get(key) {
            Some(node) if node.action_count != action_count => {
                Err(mismatch(key, node.action_count, action_count))
            }
            found => Ok(found),
        }
    }

    /// Get or create an information set entry.
    pub fn get_or_create(&mut self, key: &InfoSetKey, action_count: usize) -> CfrResult<&mut InfoSetNode> {
        match self.nodes.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let stored = entry.get().action_count;
                if stored != action_count {
                    return Err(mismatch(key, stored, action_count));
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(InfoSetNode::new(action_count))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InfoSetKey, &InfoSetNode)> {
        self.nodes.iter()
    }

    /// Fold one batch of deltas in. Every key is checked before anything is
    /// written, so a mismatch leaves the store untouched.
    pub fn apply(&mut self, deltas: &DeltaAccumulator) -> CfrResult<()> {
        for (key, delta) in deltas.iter() {
            self.lookup(key, delta.action_count())?;
        }
        for (key, delta) in deltas.iter() {
            let node = self.get_or_create(key, delta.action_count())?;
            node.add_regret(&delta.regret);
            node.add_strategy_weight(&delta.strategy);
        }
        log::trace!("applied {} deltas, store has {} nodes", deltas.len(), self.len());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Rows sorted by canonical key text.
    pub fn export(&self) -> StrategyTable {
        let mut rows: Vec<TableRow> = self
            .nodes
            .iter()
            .map(|(key, node)| TableRow {
                key: key.to_string(),
                action_count: node.action_count,
                regret_sum: node.regret_sum.clone(),
                strategy_sum: node.strategy_sum.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        StrategyTable {
            iterations: self.iterations,
            rows,
        }
    }

    /// Rebuild a store from a table. Any bad row rejects the whole table.
    pub fn import(table: StrategyTable) -> CfrResult<Self> {
        let mut nodes = HashMap::with_capacity(table.rows.len());
        let mut seen: HashSet<InfoSetKey> = HashSet::with_capacity(table.rows.len());

        for (i, row) in table.rows.into_iter().enumerate() {
            let malformed = |reason: String| CfrError::MalformedTable { row: i, reason };

            let key: InfoSetKey = row.key.parse().map_err(|e: CfrError| malformed(e.to_string()))?;
            // different spellings of one key (e.g. unpadded hand bits) collide here
            if !seen.insert(key.clone()) {
                return Err(malformed(format!("duplicate key {}", row.key)));
            }
            if row.action_count == 0 {
                return Err(malformed("action_count is 0".to_string()));
            }
            if row.regret_sum.len() != row.action_count || row.strategy_sum.len() != row.action_count {
                return Err(malformed(format!(
                    "expected {} values, got {} regrets and {} strategy weights",
                    row.action_count,
                    row.regret_sum.len(),
                    row.strategy_sum.len(),
                )));
            }
            if row.regret_sum.iter().chain(&row.strategy_sum).any(|v| !v.is_finite()) {
                return Err(malformed("non-finite value".to_string()));
            }

            nodes.insert(key, InfoSetNode::from_sums(row.regret_sum, row.strategy_sum));
        }

        Ok(InfoSetStore {
            nodes,
            iterations: table.iterations,
        })
    }

    /// Save the exported table as JSON.
    pub fn save(&self, path: &Path) -> CfrResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.export())?;
        std::fs::write(path, json)?;
        log::info!("saved {} information sets to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> CfrResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let table: StrategyTable = serde_json::from_str(&json)?;
        let store = InfoSetStore::import(table)?;
        log::info!("loaded {} information sets from {}", store.len(), path.display());
        Ok(store)
    }
}

/// Persisted form of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTable {
    #[serde(default)]
    pub iterations: usize,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    pub action_count: usize,
    pub regret_sum: Vec<f64>,
    pub strategy_sum: Vec<f64>,
}
