//! Convergence of self-play training on rock/paper/scissors.
//!
//! Against a fixed opponent the average strategy must settle on the best
//! response; in self-play both seats must approach the uniform equilibrium.

use gin_cfr::accumulator::DeltaAccumulator;
use gin_cfr::config::{TrainerConfig, Traversal};
use gin_cfr::evaluate::Evaluator;
use gin_cfr::game::{Game, Player};
use gin_cfr::games::rps::{Rps, Throw};
use gin_cfr::infoset::{CardGameEncoder, HistoryEncoder, Phase};
use gin_cfr::store::InfoSetStore;
use gin_cfr::trainer::SelfPlayTrainer;

fn config(iterations: usize, traversal: Traversal) -> TrainerConfig {
    TrainerConfig {
        iterations,
        traversal,
        ..TrainerConfig::default()
    }
}

/// Average strategy of `player` at its only decision point.
fn average(store: &InfoSetStore, game: &Rps, player: Player) -> Vec<f64> {
    let mut state = game.initial_state();
    if player == Player::Second {
        state = game.apply_action(&state, &Throw::Rock);
    }
    let key = CardGameEncoder.encode(game.trajectory(&state), player, Phase::Act);
    store
        .get(&key)
        .unwrap_or_else(|| panic!("no node for {}", key))
        .average_strategy()
}

fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() <= tol,
            "strategy {:?} not within {} of {:?}",
            actual,
            tol,
            expected,
        );
    }
}

// ---------------------------------------------------------------------------
// Fixed opponent
// ---------------------------------------------------------------------------

#[test]
fn learns_best_response_to_rock_heavy_opponent() {
    let game = Rps::against([0.4, 0.3, 0.3]);
    let mut trainer = SelfPlayTrainer::new(game.clone(), CardGameEncoder, config(100_000, Traversal::Exact)).unwrap();
    trainer.train().unwrap();

    let strategy = average(trainer.store(), &game, Player::First);
    assert_close(&strategy, &[0.0, 1.0, 0.0], 0.05);
}

#[test]
fn sampled_traversal_learns_best_response() {
    let game = Rps::against([0.4, 0.3, 0.3]);
    let mut trainer =
        SelfPlayTrainer::new(game.clone(), CardGameEncoder, config(200_000, Traversal::Sampled)).unwrap();
    trainer.train().unwrap();

    // sampled regrets keep rock and scissors alive a little longer
    let strategy = average(trainer.store(), &game, Player::First);
    assert_close(&strategy, &[0.0, 1.0, 0.0], 0.08);
}

#[test]
fn fixed_opponent_has_no_information_sets() {
    let game = Rps::against([0.4, 0.3, 0.3]);
    let mut trainer = SelfPlayTrainer::new(game, CardGameEncoder, config(10, Traversal::Exact)).unwrap();
    trainer.train().unwrap();
    assert_eq!(trainer.store().len(), 1);
}

// ---------------------------------------------------------------------------
// Self-play
// ---------------------------------------------------------------------------

#[test]
fn self_play_stays_uniform_from_scratch() {
    let game = Rps::new();
    let mut trainer = SelfPlayTrainer::new(game.clone(), CardGameEncoder, config(100_000, Traversal::Exact)).unwrap();
    trainer.train().unwrap();

    let third = 1.0 / 3.0;
    for player in [Player::First, Player::Second] {
        assert_close(&average(trainer.store(), &game, player), &[third; 3], 0.05);
    }
}

/// Start the first seat off playing pure rock and let self-play
/// pull both seats back to the equilibrium.
#[test]
fn self_play_recovers_from_biased_start() {
    let game = Rps::new();
    let root = game.initial_state();
    let key = CardGameEncoder.encode(game.trajectory(&root), Player::First, Phase::Act);

    let mut deltas = DeltaAccumulator::new();
    deltas.record(key, &[1.0, 0.0, 0.0], &[0.0; 3]).unwrap();
    let mut store = InfoSetStore::new();
    store.apply(&deltas).unwrap();

    let mut trainer =
        SelfPlayTrainer::with_store(game.clone(), CardGameEncoder, config(100_000, Traversal::Sampled), store)
            .unwrap();
    trainer.train().unwrap();

    let third = 1.0 / 3.0;
    for player in [Player::First, Player::Second] {
        assert_close(&average(trainer.store(), &game, player), &[third; 3], 0.05);
    }

    let exploitability = Evaluator::new(&game, &CardGameEncoder, trainer.store())
        .exploitability()
        .unwrap();
    assert!(
        exploitability < 0.05,
        "self-play exploitability {} should be < 0.05",
        exploitability
    );
}
