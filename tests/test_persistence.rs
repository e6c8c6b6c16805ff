//! Strategy-table export/import and JSON save/load.

use std::path::PathBuf;

use gin_cfr::config::{TrainerConfig, Traversal};
use gin_cfr::error::CfrError;
use gin_cfr::games::kuhn::Kuhn;
use gin_cfr::infoset::{CardGameEncoder, InfoSetKey};
use gin_cfr::store::{InfoSetStore, StrategyTable, TableRow};
use gin_cfr::trainer::SelfPlayTrainer;

fn trained_kuhn(iterations: usize) -> InfoSetStore {
    let config = TrainerConfig {
        iterations,
        ..TrainerConfig::default()
    };
    let mut trainer = SelfPlayTrainer::new(Kuhn::new(), CardGameEncoder, config).unwrap();
    trainer.train().unwrap();
    trainer.into_store()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("gin-cfr-test-{}", std::process::id()))
        .join(format!("{}.json", name))
}

fn row(key: &str, regret: Vec<f64>, strategy: Vec<f64>) -> TableRow {
    TableRow {
        key: key.to_string(),
        action_count: regret.len(),
        regret_sum: regret,
        strategy_sum: strategy,
    }
}

fn table_of(row: TableRow) -> StrategyTable {
    StrategyTable {
        iterations: 0,
        rows: vec![row],
    }
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn import_of_export_reproduces_average_strategies() {
    let store = trained_kuhn(500);
    assert_eq!(store.len(), 12, "Kuhn has 12 information sets");

    let restored = InfoSetStore::import(store.export()).unwrap();
    assert_eq!(restored.len(), store.len());
    for (key, node) in store.iter() {
        let other = restored.get(key).unwrap();
        for (a, b) in node.average_strategy().iter().zip(other.average_strategy()) {
            assert!((a - b).abs() < 1e-9, "{}: {} vs {}", key, a, b);
        }
    }
}

#[test]
fn export_rows_are_sorted_by_key() {
    let table = trained_kuhn(20).export();
    let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn save_and_load_are_bit_identical() {
    let store = trained_kuhn(300);
    let path = temp_path("kuhn-roundtrip");
    store.save(&path).unwrap();
    let loaded = InfoSetStore::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.len(), store.len());
    for (key, node) in store.iter() {
        let other = loaded.get(key).unwrap();
        assert_eq!(node.regret_sum(), other.regret_sum());
        assert_eq!(node.average_strategy(), other.average_strategy());
    }
}

#[test]
fn loaded_table_keeps_training() {
    let store = trained_kuhn(100);
    let path = temp_path("kuhn-resume");
    store.save(&path).unwrap();
    let loaded = InfoSetStore::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let config = TrainerConfig {
        iterations: 50,
        ..TrainerConfig::default()
    };
    let mut trainer = SelfPlayTrainer::with_store(Kuhn::new(), CardGameEncoder, config, loaded).unwrap();
    let report = trainer.train().unwrap();
    assert_eq!(report.iterations, 50);
    assert_eq!(trainer.store().len(), 12);
}

#[test]
fn resumed_training_continues_the_seed_stream() {
    let sampled = |iterations| TrainerConfig {
        iterations,
        traversal: Traversal::Sampled,
        ..TrainerConfig::default()
    };

    let mut first = SelfPlayTrainer::new(Kuhn::new(), CardGameEncoder, sampled(100)).unwrap();
    first.train().unwrap();
    let path = temp_path("kuhn-seed-stream");
    first.store().save(&path).unwrap();
    let loaded = InfoSetStore::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.iterations(), 100);

    let mut resumed = SelfPlayTrainer::with_store(Kuhn::new(), CardGameEncoder, sampled(50), loaded).unwrap();
    let report = resumed.train().unwrap();
    assert_eq!(report.iterations, 50);
    assert_eq!(report.total_iterations, 150);

    let mut straight = SelfPlayTrainer::new(Kuhn::new(), CardGameEncoder, sampled(150)).unwrap();
    straight.train().unwrap();
    assert_eq!(
        resumed.store().export(),
        straight.store().export(),
        "a resumed run must draw the chance samples an uninterrupted run would"
    );
}

#[test]
fn missing_file_is_io_error() {
    let err = InfoSetStore::load(&temp_path("does-not-exist")).unwrap_err();
    assert!(matches!(err, CfrError::Io(_)));
}

// ---------------------------------------------------------------------------
// Malformed tables
// ---------------------------------------------------------------------------

const KEY_A: &str = "act|p0|0000000000001|p0.deal,p1.deal";
const KEY_B: &str = "act|p1|0000000000002|p0.deal,p1.deal,p0.choice:#0";

#[test]
fn well_formed_table_imports() {
    let table = StrategyTable {
        iterations: 0,
        rows: vec![
            row(KEY_A, vec![1.0, 0.0], vec![3.0, 1.0]),
            row(KEY_B, vec![0.0, 2.0], vec![0.0, 4.0]),
        ],
    };
    let store = InfoSetStore::import(table).unwrap();
    assert_eq!(store.len(), 2);
    let key = KEY_A.parse().unwrap();
    assert_eq!(store.get(&key).unwrap().average_strategy(), vec![0.75, 0.25]);
}

#[test]
fn bad_key_rejects_table() {
    let table = StrategyTable {
        iterations: 0,
        rows: vec![
            row(KEY_A, vec![1.0, 0.0], vec![3.0, 1.0]),
            row("not-a-key", vec![0.0], vec![1.0]),
        ],
    };
    assert!(matches!(
        InfoSetStore::import(table),
        Err(CfrError::MalformedTable { row: 1, .. })
    ));
}

#[test]
fn duplicate_key_rejects_table() {
    let table = StrategyTable {
        iterations: 0,
        rows: vec![
            row(KEY_A, vec![1.0, 0.0], vec![3.0, 1.0]),
            row(KEY_A, vec![1.0, 0.0], vec![3.0, 1.0]),
        ],
    };
    assert!(matches!(
        InfoSetStore::import(table),
        Err(CfrError::MalformedTable { row: 1, .. })
    ));
}

#[test]
fn differently_spelled_duplicate_rejects_table() {
    // unpadded hand bits name the same information set
    let padded = "act|p0|0000000000000|";
    let short = "act|p0|0|";
    assert_eq!(
        padded.parse::<InfoSetKey>().unwrap(),
        short.parse::<InfoSetKey>().unwrap()
    );
    let table = StrategyTable {
        iterations: 0,
        rows: vec![
            row(padded, vec![0.0, 1.0], vec![1.0, 1.0]),
            row(short, vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]),
        ],
    };
    assert!(matches!(
        InfoSetStore::import(table),
        Err(CfrError::MalformedTable { row: 1, .. })
    ));
}

#[test]
fn length_mismatch_rejects_table() {
    let mut bad = row(KEY_A, vec![1.0, 0.0], vec![3.0, 1.0]);
    bad.action_count = 3;
    assert!(InfoSetStore::import(table_of(bad)).is_err());

    let short = TableRow {
        key: KEY_B.to_string(),
        action_count: 2,
        regret_sum: vec![0.0, 0.0],
        strategy_sum: vec![1.0],
    };
    assert!(InfoSetStore::import(table_of(short)).is_err());
}

#[test]
fn zero_actions_rejects_table() {
    let empty = row(KEY_A, vec![], vec![]);
    assert!(matches!(
        InfoSetStore::import(table_of(empty)),
        Err(CfrError::MalformedTable { row: 0, .. })
    ));
}

#[test]
fn non_finite_value_rejects_table() {
    let table = StrategyTable {
        iterations: 0,
        rows: vec![row(KEY_A, vec![f64::NAN, 0.0], vec![1.0, 1.0])],
    };
    assert!(InfoSetStore::import(table).is_err());

    let table = StrategyTable {
        iterations: 0,
        rows: vec![row(KEY_A, vec![0.0, 0.0], vec![f64::INFINITY, 1.0])],
    };
    assert!(InfoSetStore::import(table).is_err());
}

#[test]
fn truncated_json_is_json_error() {
    let path = temp_path("truncated");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "rows": [ { "key": "#).unwrap();
    let err = InfoSetStore::load(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, CfrError::JsonError(_)));
}
