//! Self-play CFR trainer.
//!
//! Each iteration walks the whole game tree (or, with sampled traversal, one
//! chance outcome per chance node) from the initial state. At a decision node
//! the walker computes the regret-matched strategy, recurses into every
//! legal action and records
//!
//!   regret[a]   += cf_reach * (u[a] - u_node)
//!   strategy[a] += own_reach * sigma[a]
//!
//! where `cf_reach` is the opponent's reach times the chance reach.
//!
//! Walks read the strategy from the store as it stood at the start of the
//! batch and write into a private `DeltaAccumulator`; the store changes only
//! between batches. With `threads > 1` the batch is split across rayon
//! workers and their accumulators are summed before the single apply.

use std::ops::Range;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::accumulator::DeltaAccumulator;
use crate::config::{TrainerConfig, Traversal};
use crate::error::{CfrError, CfrResult};
use crate::game::Game;
use crate::infoset::HistoryEncoder;
use crate::regret;
use crate::store::InfoSetStore;

/// Summary of one `train`/`train_until` call.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Iterations run by this call.
    pub iterations: usize,
    /// Iterations the store has absorbed in total.
    pub total_iterations: usize,
    pub info_sets: usize,
    pub elapsed_secs: f64,
    pub stopped_early: bool,
}

pub struct SelfPlayTrainer<G, E> {
    game: G,
    encoder: E,
    config: TrainerConfig,
    store: InfoSetStore,
    iterations_done: usize,
    pool: Option<rayon::ThreadPool>,
}

/// Independent RNG for iteration `t`, so a sampled run draws the same
/// chance outcomes whatever the worker count.
fn iteration_rng(seed: u64, t: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (t as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Split `range` into at most `parts` contiguous, non-empty pieces.
fn split_range(range: Range<usize>, parts: usize) -> Vec<Range<usize>> {
    let len = range.len();
    let parts = parts.min(len).max(1);
    let base = len / parts;
    let extra = len % parts;
    let mut start = range.start;
    (0..parts)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let piece = start..start + size;
            start += size;
            piece
        })
        .collect()
}

impl<G, E> SelfPlayTrainer<G, E>
where
    G: Game + Sync,
    E: HistoryEncoder + Sync,
{
    pub fn new(game: G, encoder: E, config: TrainerConfig) -> CfrResult<Self> {
        Self::with_store(game, encoder, config, InfoSetStore::new())
    }

    /// Continue training an existing store. Iteration numbering (and with it
    /// the per-iteration RNG stream) picks up where the store left off.
    pub fn with_store(game: G, encoder: E, config: TrainerConfig, store: InfoSetStore) -> CfrResult<Self> {
        config.validate()?;
        let pool = if config.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| CfrError::InvalidConfig(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(SelfPlayTrainer {
            game,
            encoder,
            config,
            iterations_done: store.iterations(),
            store,
            pool,
        })
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn store(&self) -> &InfoSetStore {
        &self.store
    }

    /// End training and hand the store over for match play or saving.
    pub fn into_store(self) -> InfoSetStore {
        self.store
    }

    pub fn iterations_done(&self) -> usize {
        self.iterations_done
    }

    /// Run `config.iterations` iterations.
    pub fn train(&mut self) -> CfrResult<TrainingReport> {
        self.train_until(self.config.iterations, |_| false)
    }

    /// Run up to `iterations` more iterations, asking `should_stop` before
    /// every batch. The store is a valid strategy table whenever this
    /// returns, stopped early or not.
    pub fn train_until<F>(&mut self, iterations: usize, mut should_stop: F) -> CfrResult<TrainingReport>
    where
        F: FnMut(usize) -> bool,
    {
        let start = Instant::now();
        let first = self.iterations_done;
        let end = first + iterations;
        let log_every = (iterations / 10).max(1);
        let mut next_log = first + log_every;
        let mut stopped_early = false;

        log::info!(
            "training {} iterations ({:?} traversal, {} thread(s), batch {})",
            iterations,
            self.config.traversal,
            self.config.threads,
            self.config.batch_size,
        );

        while self.iterations_done < end {
            if should_stop(self.iterations_done) {
                stopped_early = true;
                log::info!("stop requested after {} iterations", self.iterations_done - first);
                break;
            }

            let batch_end = (self.iterations_done + self.config.batch_size).min(end);
            let deltas = self.batch(self.iterations_done..batch_end)?;
            self.store.apply(&deltas)?;
            self.store.set_iterations(batch_end);
            self.iterations_done = batch_end;

            if self.iterations_done >= next_log {
                log::debug!(
                    "iteration {}/{}: {} information sets",
                    self.iterations_done - first,
                    iterations,
                    self.store.len(),
                );
                next_log += log_every;
            }
        }

        let report = TrainingReport {
            iterations: self.iterations_done - first,
            total_iterations: self.iterations_done,
            info_sets: self.store.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
            stopped_early,
        };
        log::info!(
            "trained {} iterations in {:.2}s, {} information sets",
            report.iterations,
            report.elapsed_secs,
            report.info_sets,
        );
        Ok(report)
    }

    fn batch(&self, iterations: Range<usize>) -> CfrResult<DeltaAccumulator> {
        match &self.pool {
            Some(pool) if iterations.len() > 1 => {
                let pieces = split_range(iterations, self.config.threads);
                pool.install(|| {
                    pieces
                        .into_par_iter()
                        .map(|piece| self.accumulate(piece))
                        .try_reduce(DeltaAccumulator::new, |a, b| a.merged(b))
                })
            }
            _ => self.accumulate(iterations),
        }
    }

    /// Walk iterations `iterations` against the current store and return
    /// their deltas without applying them.
    pub fn accumulate(&self, iterations: Range<usize>) -> CfrResult<DeltaAccumulator> {
        let mut deltas = DeltaAccumulator::new();
        for t in iterations {
            let mut walk = Walk {
                game: &self.game,
                encoder: &self.encoder,
                store: &self.store,
                deltas: &mut deltas,
                traversal: self.config.traversal,
                max_depth: self.config.max_depth,
                rng: iteration_rng(self.config.seed, t),
            };
            walk.walk(&self.game.initial_state(), [1.0, 1.0], 1.0, 0)?;
        }
        Ok(deltas)
    }
}

struct Walk<'a, G, E> {
    game: &'a G,
    encoder: &'a E,
    store: &'a InfoSetStore,
    deltas: &'a mut DeltaAccumulator,
    traversal: Traversal,
    max_depth: usize,
    rng: StdRng,
}

impl<G: Game, E: HistoryEncoder> Walk<'_, G, E> {
    /// Returns the utility vector of `state` under the current profile.
    fn walk(&mut self, state: &G::State, reach: [f64; 2], chance: f64, depth: usize) -> CfrResult<[f64; 2]> {
        if depth > self.max_depth {
            return Err(CfrError::DepthExceeded(self.max_depth));
        }
        if self.game.is_terminal(state) {
            return Ok(self.game.utilities(state));
        }
        if self.game.is_chance(state) {
            return self.walk_chance(state, reach, chance, depth);
        }
        self.walk_decision(state, reach, chance, depth)
    }

    fn walk_chance(&mut self, state: &G::State, reach: [f64; 2], chance: f64, depth: usize) -> CfrResult<[f64; 2]> {
        let outcomes = self.game.chance_outcomes(state);

        match self.traversal {
            Traversal::Exact => {
                let mut value = [0.0; 2];
                for (child, p) in &outcomes {
                    let u = self.walk(child, reach, chance * p, depth + 1)?;
                    value[0] += p * u[0];
                    value[1] += p * u[1];
                }
                Ok(value)
            }
            Traversal::Sampled => {
                let probs: Vec<f64> = outcomes.iter().map(|(_, p)| *p).collect();
                let total: f64 = probs.iter().sum();
                let r = self.rng.gen::<f64>() * total;
                match outcomes.get(regret::sample(&probs, r)) {
                    Some((child, _)) => self.walk(child, reach, chance, depth + 1),
                    None => Ok([0.0; 2]),
                }
            }
        }
    }

    fn walk_decision(&mut self, state: &G::State, reach: [f64; 2], chance: f64, depth: usize) -> CfrResult<[f64; 2]> {
        let player = self.game.current_player(state);
        let p = player.index();
        let o = player.opponent().index();
        let actions = self.game.legal_actions(state);
        if actions.is_empty() {
            return Err(CfrError::IllegalSample { index: 0, legal: 0 });
        }
        let key = self
            .encoder
            .encode(self.game.trajectory(state), player, self.game.phase(state));

        let strategy = match self.store.lookup(&key, actions.len())? {
            Some(node) => node.current_strategy(),
            None => regret::uniform(actions.len()),
        };

        let mut action_utility = Vec::with_capacity(actions.len());
        let mut node_utility = [0.0; 2];
        for (action, &sigma) in actions.iter().zip(&strategy) {
            let child = self.game.apply_action(state, action);
            let mut child_reach = reach;
            child_reach[p] *= sigma;
            let u = self.walk(&child, child_reach, chance, depth + 1)?;
            node_utility[0] += sigma * u[0];
            node_utility[1] += sigma * u[1];
            action_utility.push(u[p]);
        }

        let cf_reach = reach[o] * chance;
        let regret: Vec<f64> = action_utility
            .iter()
            .map(|u| cf_reach * (u - node_utility[p]))
            .collect();
        let mut weight = vec![0.0; actions.len()];
        regret::accumulate(&mut weight, &strategy, reach[p]);
        self.deltas.record(key, &regret, &weight)?;

        Ok(node_utility)
    }
}
