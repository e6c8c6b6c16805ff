//! Read-only policy over a trained store, for match play.

use rand::Rng;

use crate::error::{CfrError, CfrResult};
use crate::game::Player;
use crate::history::HistoryEntry;
use crate::infoset::{HistoryEncoder, InfoSetKey, Phase};
use crate::regret;
use crate::store::InfoSetStore;

pub struct PolicyPlayer<'a, E> {
    store: &'a InfoSetStore,
    encoder: E,
}

impl<'a, E: HistoryEncoder> PolicyPlayer<'a, E> {
    pub fn new(store: &'a InfoSetStore, encoder: E) -> Self {
        PolicyPlayer { store, encoder }
    }

    pub fn store(&self) -> &InfoSetStore {
        self.store
    }

    pub fn key(&self, trajectory: &[HistoryEntry], player: Player, phase: Phase) -> InfoSetKey {
        self.encoder.encode(trajectory, player, phase)
    }

    /// Average strategy at the current decision point; uniform when the
    /// information set was never trained.
    pub fn strategy(
        &self,
        trajectory: &[HistoryEntry],
        player: Player,
        phase: Phase,
        action_count: usize,
    ) -> CfrResult<Vec<f64>> {
        let key = self.key(trajectory, player, phase);
        Ok(match self.store.lookup(&key, action_count)? {
            Some(node) => node.average_strategy(),
            None => regret::uniform(action_count),
        })
    }

    /// Sample an action from the average strategy.
    pub fn act<A: Clone, R: Rng + ?Sized>(
        &self,
        trajectory: &[HistoryEntry],
        player: Player,
        phase: Phase,
        legal_actions: &[A],
        rng: &mut R,
    ) -> CfrResult<A> {
        let strategy = self.strategy(trajectory, player, phase, legal_actions.len())?;
        let r: f64 = rng.gen();
        let index = regret::sample(&strategy, r);
        legal_actions
            .get(index)
            .cloned()
            .ok_or(CfrError::IllegalSample {
                index,
                legal: legal_actions.len(),
            })
    }
}
