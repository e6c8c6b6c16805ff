//! Private per-worker table of regret and strategy-weight deltas.
//!
//! Walks write here instead of into the shared store, so the strategy
//! profile stays fixed for a whole batch and workers never contend. Merging
//! is plain addition over matching keys.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{CfrError, CfrResult};
use crate::infoset::InfoSetKey;

#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub regret: Vec<f64>,
    pub strategy: Vec<f64>,
}

impl Delta {
    fn zeroed(action_count: usize) -> Self {
        Delta {
            regret: vec![0.0; action_count],
            strategy: vec![0.0; action_count],
        }
    }

    pub fn action_count(&self) -> usize {
        self.regret.len()
    }

    fn add(&mut self, other: &Delta) {
        for (a, b) in self.regret.iter_mut().zip(&other.regret) {
            *a += b;
        }
        for (a, b) in self.strategy.iter_mut().zip(&other.strategy) {
            *a += b;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeltaAccumulator {
    deltas: HashMap<InfoSetKey, Delta>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        DeltaAccumulator::default()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn get(&self, key: &InfoSetKey) -> Option<&Delta> {
        self.deltas.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InfoSetKey, &Delta)> {
        self.deltas.iter()
    }

    fn entry(&mut self, key: InfoSetKey, action_count: usize) -> CfrResult<&mut Delta> {
        match self.deltas.entry(key) {
            Entry::Occupied(entry) => {
                let stored = entry.get().action_count();
                if stored != action_count {
                    return Err(CfrError::AbstractionMismatch {
                        key: entry.key().to_string(),
                        stored,
                        requested: action_count,
                    });
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(Delta::zeroed(action_count))),
        }
    }

    /// Add one visit's regret and strategy weight for `key`.
    pub fn record(&mut self, key: InfoSetKey, regret: &[f64], strategy: &[f64]) -> CfrResult<()> {
        let delta = self.entry(key, regret.len())?;
        for (a, b) in delta.regret.iter_mut().zip(regret) {
            *a += b;
        }
        for (a, b) in delta.strategy.iter_mut().zip(strategy) {
            *a += b;
        }
        Ok(())
    }

    /// Add every delta of `other` into `self`.
    pub fn merge(&mut self, other: &DeltaAccumulator) -> CfrResult<()> {
        for (key, delta) in other.iter() {
            self.entry(key.clone(), delta.action_count())?.add(delta);
        }
        Ok(())
    }

    /// Owned merge, smaller table folded into the larger one.
    pub fn merged(mut self, mut other: DeltaAccumulator) -> CfrResult<DeltaAccumulator> {
        if other.len() > self.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.merge(&other)?;
        Ok(self)
    }
}
