//! Evaluation of trained average strategies.
//!
//! `Evaluator` enumerates the whole tree (chance nodes exactly), so it is
//! only practical for small games. `play_match` samples games instead and
//! works for any size.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{CfrError, CfrResult};
use crate::game::{Game, Player, PLAYERS};
use crate::infoset::{HistoryEncoder, InfoSetKey};
use crate::policy::PolicyPlayer;
use crate::regret;
use crate::store::InfoSetStore;

pub struct Evaluator<'a, G, E> {
    game: &'a G,
    encoder: &'a E,
    store: &'a InfoSetStore,
    max_depth: usize,
}

impl<'a, G: Game, E: HistoryEncoder> Evaluator<'a, G, E> {
    pub fn new(game: &'a G, encoder: &'a E, store: &'a InfoSetStore) -> Self {
        Evaluator {
            game,
            encoder,
            store,
            max_depth: 512,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn check_depth(&self, depth: usize) -> CfrResult<()> {
        if depth > self.max_depth {
            return Err(CfrError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }

    fn key(&self, state: &G::State) -> InfoSetKey {
        let player = self.game.current_player(state);
        self.encoder
            .encode(self.game.trajectory(state), player, self.game.phase(state))
    }

    /// Average strategy at a decision node, uniform where untrained.
    fn average(&self, state: &G::State, action_count: usize) -> CfrResult<Vec<f64>> {
        Ok(match self.store.lookup(&self.key(state), action_count)? {
            Some(node) => node.average_strategy(),
            None => regret::uniform(action_count),
        })
    }

    /// Expected utility of both seats when both play the average strategy.
    pub fn expected_values(&self) -> CfrResult<[f64; 2]> {
        self.profile_value(&self.game.initial_state(), 0)
    }

    fn profile_value(&self, state: &G::State, depth: usize) -> CfrResult<[f64; 2]> {
        self.check_depth(depth)?;
        if self.game.is_terminal(state) {
            return Ok(self.game.utilities(state));
        }

        let branches: Vec<(G::State, f64)> = if self.game.is_chance(state) {
            self.game.chance_outcomes(state)
        } else {
            let actions = self.game.legal_actions(state);
            let strategy = self.average(state, actions.len())?;
            actions
                .iter()
                .zip(strategy)
                .map(|(a, p)| (self.game.apply_action(state, a), p))
                .collect()
        };

        let mut value = [0.0; 2];
        for (child, p) in branches.iter().filter(|(_, p)| *p > 0.0) {
            let u = self.profile_value(child, depth + 1)?;
            value[0] += p * u[0];
            value[1] += p * u[1];
        }
        Ok(value)
    }

    /// Value `responder` gets by best-responding to the other seat's
    /// average strategy.
    pub fn best_response_value(&self, responder: Player) -> CfrResult<f64> {
        let mut br = BestResponse {
            eval: self,
            responder,
            choices: HashMap::new(),
        };

        let mut levels = HashMap::new();
        br.collect_levels(&self.game.initial_state(), 0, 0, &mut levels)?;
        let deepest = levels.values().copied().max();

        // Deeper own decisions are fixed first, so each pass sees a complete
        // best-response continuation below the level it is solving.
        if let Some(deepest) = deepest {
            for level in (0..=deepest).rev() {
                let mut totals: HashMap<InfoSetKey, Vec<f64>> = HashMap::new();
                br.tally(&self.game.initial_state(), 1.0, level, 0, 0, &mut totals)?;
                for (key, values) in totals {
                    br.choices.insert(key, argmax(&values));
                }
            }
        }

        br.value(&self.game.initial_state(), 0)
    }

    /// Mean gain the two seats could get by best-responding:
    /// `(br(first) + br(second)) / 2` for a zero-sum game.
    pub fn exploitability(&self) -> CfrResult<f64> {
        let mut total = 0.0;
        for player in PLAYERS {
            total += self.best_response_value(player)?;
        }
        Ok(total / 2.0)
    }
}

/// First index of the largest value.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

struct BestResponse<'e, 'a, G, E> {
    eval: &'e Evaluator<'a, G, E>,
    responder: Player,
    choices: HashMap<InfoSetKey, usize>,
}

impl<G: Game, E: HistoryEncoder> BestResponse<'_, '_, G, E> {
    fn game(&self) -> &G {
        self.eval.game
    }

    /// Record, for every responder information set, how many responder
    /// decisions precede it.
    fn collect_levels(
        &self,
        state: &G::State,
        level: usize,
        depth: usize,
        levels: &mut HashMap<InfoSetKey, usize>,
    ) -> CfrResult<()> {
        self.eval.check_depth(depth)?;
        let game = self.game();
        if game.is_terminal(state) {
            return Ok(());
        }
        if game.is_chance(state) {
            for (child, _) in game.chance_outcomes(state) {
                self.collect_levels(&child, level, depth + 1, levels)?;
            }
            return Ok(());
        }

        let own = game.current_player(state) == self.responder;
        if own {
            levels.insert(self.eval.key(state), level);
        }
        let next_level = if own { level + 1 } else { level };
        for action in game.legal_actions(state) {
            self.collect_levels(&game.apply_action(state, &action), next_level, depth + 1, levels)?;
        }
        Ok(())
    }

    /// Sum counterfactual action values of every responder information set
    /// at `target` level.
    fn tally(
        &self,
        state: &G::State,
        cf_reach: f64,
        target: usize,
        level: usize,
        depth: usize,
        totals: &mut HashMap<InfoSetKey, Vec<f64>>,
    ) -> CfrResult<()> {
        self.eval.check_depth(depth)?;
        let game = self.game();
        if game.is_terminal(state) {
            return Ok(());
        }
        if game.is_chance(state) {
            for (child, p) in game.chance_outcomes(state) {
                self.tally(&child, cf_reach * p, target, level, depth + 1, totals)?;
            }
            return Ok(());
        }

        let actions = game.legal_actions(state);
        if game.current_player(state) != self.responder {
            let strategy = self.eval.average(state, actions.len())?;
            for (action, sigma) in actions.iter().zip(strategy) {
                if sigma > 0.0 {
                    let child = game.apply_action(state, action);
                    self.tally(&child, cf_reach * sigma, target, level, depth + 1, totals)?;
                }
            }
            return Ok(());
        }

        if level < target {
            for action in &actions {
                let child = game.apply_action(state, action);
                self.tally(&child, cf_reach, target, level + 1, depth + 1, totals)?;
            }
            return Ok(());
        }

        let mut values = Vec::with_capacity(actions.len());
        for action in &actions {
            values.push(cf_reach * self.value(&game.apply_action(state, action), depth + 1)?);
        }
        let sums = totals
            .entry(self.eval.key(state))
            .or_insert_with(|| vec![0.0; actions.len()]);
        for (sum, v) in sums.iter_mut().zip(values) {
            *sum += v;
        }
        Ok(())
    }

    /// Responder's expected utility with its decisions fixed to `choices`
    /// (first action where none was chosen).
    fn value(&self, state: &G::State, depth: usize) -> CfrResult<f64> {
        self.eval.check_depth(depth)?;
        let game = self.game();
        if game.is_terminal(state) {
            return Ok(game.utility(state, self.responder));
        }
        if game.is_chance(state) {
            let mut total = 0.0;
            for (child, p) in game.chance_outcomes(state) {
                total += p * self.value(&child, depth + 1)?;
            }
            return Ok(total);
        }

        let actions = game.legal_actions(state);
        if game.current_player(state) == self.responder {
            let choice = self.choices.get(&self.eval.key(state)).copied().unwrap_or(0);
            return match actions.get(choice) {
                Some(action) => self.value(&game.apply_action(state, action), depth + 1),
                None => Err(CfrError::IllegalSample {
                    index: choice,
                    legal: actions.len(),
                }),
            };
        }

        let strategy = self.eval.average(state, actions.len())?;
        let mut total = 0.0;
        for (action, sigma) in actions.iter().zip(strategy) {
            if sigma > 0.0 {
                total += sigma * self.value(&game.apply_action(state, action), depth + 1)?;
            }
        }
        Ok(total)
    }
}

/// Outcome of a sampled match between two policies.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub games: usize,
    /// Summed utility per seat.
    pub total: [f64; 2],
    pub wins: [usize; 2],
    pub draws: usize,
}

impl MatchReport {
    pub fn mean(&self, player: Player) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total[player.index()] / self.games as f64
    }
}

/// Play `games` sampled games, `seats[i]` acting for player `i`.
pub fn play_match<G, E, R>(
    game: &G,
    seats: [&PolicyPlayer<'_, E>; 2],
    games: usize,
    rng: &mut R,
) -> CfrResult<MatchReport>
where
    G: Game,
    E: HistoryEncoder,
    R: Rng + ?Sized,
{
    let mut report = MatchReport::default();
    for _ in 0..games {
        let mut state = game.initial_state();
        while !game.is_terminal(&state) {
            state = if game.is_chance(&state) {
                let mut outcomes = game.chance_outcomes(&state);
                let probs: Vec<f64> = outcomes.iter().map(|(_, p)| *p).collect();
                let total: f64 = probs.iter().sum();
                let index = regret::sample(&probs, rng.gen::<f64>() * total);
                if index >= outcomes.len() {
                    return Err(CfrError::IllegalSample {
                        index,
                        legal: outcomes.len(),
                    });
                }
                outcomes.swap_remove(index).0
            } else {
                let player = game.current_player(&state);
                let actions = game.legal_actions(&state);
                let action = seats[player.index()].act(
                    game.trajectory(&state),
                    player,
                    game.phase(&state),
                    &actions,
                    rng,
                )?;
                game.apply_action(&state, &action)
            };
        }

        let u = game.utilities(&state);
        report.games += 1;
        report.total[0] += u[0];
        report.total[1] += u[1];
        if u[0] > u[1] {
            report.wins[0] += 1;
        } else if u[1] > u[0] {
            report.wins[1] += 1;
        } else {
            report.draws += 1;
        }
    }
    log::debug!(
        "match over {} games: {:.3} / {:.3}",
        report.games,
        report.mean(Player::First),
        report.mean(Player::Second),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rps::Rps;
    use crate::infoset::CardGameEncoder;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
    }

    #[test]
    fn uniform_rps_is_unexploitable() {
        let game = Rps::new();
        let store = InfoSetStore::new();
        let eval = Evaluator::new(&game, &CardGameEncoder, &store);
        let values = eval.expected_values().unwrap();
        assert!(values[0].abs() < 1e-12);
        assert!(eval.exploitability().unwrap().abs() < 1e-12);
    }

    #[test]
    fn fixed_rock_heavy_opponent_is_exploitable() {
        // best response to 0.4/0.3/0.3 is paper, worth 0.4 - 0.3
        let game = Rps::against([0.4, 0.3, 0.3]);
        let store = InfoSetStore::new();
        let eval = Evaluator::new(&game, &CardGameEncoder, &store);
        let br = eval.best_response_value(Player::First).unwrap();
        assert!((br - 0.1).abs() < 1e-12);
    }
}
