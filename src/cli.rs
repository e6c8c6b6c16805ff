use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{TrainerConfig, Traversal};
use crate::display::{
    match_table, print_error, print_section, print_success, probability_bar, store_table,
    strategy_display, training_table,
};
use crate::error::{CfrError, CfrResult};
use crate::evaluate::{play_match, Evaluator};
use crate::game::{Game, Player};
use crate::games::{GameKind, Kuhn, MiniGin, MiniGinConfig, Rps};
use crate::infoset::{CardGameEncoder, InfoSetKey};
use crate::policy::PolicyPlayer;
use crate::store::InfoSetStore;
use crate::trainer::SelfPlayTrainer;

#[derive(Parser)]
#[command(
    name = "gin-cfr",
    version,
    about = "Self-play CFR for small imperfect-information card games: train, inspect, evaluate and play strategy tables."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum TraversalArg {
    Exact,
    Sampled,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Exact => Traversal::Exact,
            TraversalArg::Sampled => Traversal::Sampled,
        }
    }
}

#[derive(Args, Clone)]
struct GameArgs {
    /// Game: rps, kuhn or mini-gin
    #[arg(short, long, default_value = "kuhn")]
    game: String,
    /// rps only: fixed second-player mix, e.g. "0.4,0.3,0.3"
    #[arg(long)]
    against: Option<String>,
    /// mini-gin: ranks in the deck (ace upward)
    #[arg(long)]
    ranks: Option<usize>,
    /// mini-gin: suits in the deck
    #[arg(long)]
    suits: Option<usize>,
    /// mini-gin: cards per hand
    #[arg(long)]
    hand_size: Option<usize>,
    /// mini-gin: highest deadwood that may knock
    #[arg(long)]
    knock_threshold: Option<u32>,
    /// mini-gin: turns before the hand is void
    #[arg(long)]
    max_turns: Option<usize>,
}

impl GameArgs {
    fn kind(&self) -> CfrResult<GameKind> {
        self.game.parse()
    }

    fn rps(&self) -> CfrResult<Rps> {
        match &self.against {
            None => Ok(Rps::new()),
            Some(mix) => Ok(Rps::against(parse_mix(mix)?)),
        }
    }

    fn mini_gin(&self) -> CfrResult<MiniGin> {
        let defaults = MiniGinConfig::default();
        MiniGin::new(MiniGinConfig {
            ranks: self.ranks.unwrap_or(defaults.ranks),
            suits: self.suits.unwrap_or(defaults.suits),
            hand_size: self.hand_size.unwrap_or(defaults.hand_size),
            knock_threshold: self.knock_threshold.unwrap_or(defaults.knock_threshold),
            max_turns: self.max_turns.unwrap_or(defaults.max_turns),
            ..defaults
        })
    }
}

/// "r,p,s" probabilities for a fixed rock/paper/scissors player.
fn parse_mix(mix: &str) -> CfrResult<[f64; 3]> {
    let bad = || CfrError::InvalidConfig(format!("expected three probabilities like 0.4,0.3,0.3, got '{}'", mix));
    let values = mix
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|_| bad()))
        .collect::<CfrResult<Vec<f64>>>()?;
    let [r, p, s] = values.as_slice() else {
        return Err(bad());
    };
    let total = r + p + s;
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) || total <= 0.0 {
        return Err(bad());
    }
    Ok([r / total, p / total, s / total])
}

#[derive(Args)]
struct TrainArgs {
    #[command(flatten)]
    game: GameArgs,
    /// Iterations to run
    #[arg(short = 'n', long)]
    iterations: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Chance handling: exact enumeration or one sample per visit
    #[arg(short, long)]
    traversal: Option<TraversalArg>,
    /// Worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,
    /// Iterations per batch against a frozen strategy
    #[arg(long)]
    batch: Option<usize>,
    /// Recursion budget per walk
    #[arg(long)]
    max_depth: Option<usize>,
    /// Write the trained table here
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// JSON trainer config; flags given on the command line win
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Continue training a saved table
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Report value and exploitability afterwards (small games only)
    #[arg(long)]
    eval: bool,
}

impl TrainArgs {
    fn trainer_config(&self) -> CfrResult<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_json_file(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(traversal) = &self.traversal {
            config.traversal = traversal.clone().into();
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(batch) = self.batch {
            config.batch_size = batch;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(out) = &self.out {
            config.table_path = Some(out.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a strategy table by self-play
    Train(TrainArgs),
    /// List the information sets of a saved table
    Show {
        /// Saved table (JSON)
        table: PathBuf,
        /// Only keys containing this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Rows to print
        #[arg(short, long, default_value_t = 40)]
        limit: usize,
        /// Print one information set in detail
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Expected value and exploitability of a saved table
    Eval {
        #[command(flatten)]
        game: GameArgs,
        /// Saved table (JSON)
        table: PathBuf,
    },
    /// Play a saved table against another table (or a uniform random player)
    Play {
        #[command(flatten)]
        game: GameArgs,
        /// Saved table (JSON)
        table: PathBuf,
        /// Opponent table; uniform random when omitted
        #[arg(long)]
        opponent: Option<PathBuf>,
        /// Games per seating
        #[arg(short = 'n', long, default_value_t = 5000)]
        games: usize,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

fn dispatch(cli: Cli) {
    let result = match cli.command {
        Commands::Train(args) => cmd_train(args),
        Commands::Show {
            table,
            filter,
            limit,
            key,
        } => cmd_show(&table, filter.as_deref(), limit, key.as_deref()),
        Commands::Eval { game, table } => cmd_eval(&game, &table),
        Commands::Play {
            game,
            table,
            opponent,
            games,
            seed,
        } => cmd_play(&game, &table, opponent.as_deref(), games, seed),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn cmd_train(args: TrainArgs) -> CfrResult<()> {
    let config = args.trainer_config()?;
    let kind = args.game.kind()?;
    match kind {
        GameKind::Rps => train(kind, args.game.rps()?, config, &args),
        GameKind::Kuhn => train(kind, Kuhn::new(), config, &args),
        GameKind::MiniGin => train(kind, args.game.mini_gin()?, config, &args),
    }
}

fn train<G: Game + Sync>(kind: GameKind, game: G, config: TrainerConfig, args: &TrainArgs) -> CfrResult<()> {
    let store = match &args.resume {
        Some(path) => InfoSetStore::load(path)?,
        None => InfoSetStore::new(),
    };

    println!();
    println!(
        "  {} Training {} | {} iterations | {:?} traversal | {} thread(s)",
        "CFR".bold(),
        kind,
        config.iterations,
        config.traversal,
        config.threads,
    );
    println!();

    let mut trainer = SelfPlayTrainer::with_store(game, CardGameEncoder, config, store)?;
    let report = trainer.train()?;
    println!("{}", training_table(kind.name(), &report));

    if args.eval {
        let eval = Evaluator::new(trainer.game(), trainer.encoder(), trainer.store())
            .with_max_depth(trainer.config().max_depth);
        print_evaluation(&eval)?;
    }

    if let Some(path) = &trainer.config().table_path {
        trainer.store().save(path)?;
        println!();
        println!("  Table saved to {}", path.display().to_string().dimmed());
        println!(
            "  Use {} to inspect it.",
            format!("gin-cfr show {}", path.display()).bold()
        );
    }
    println!();
    Ok(())
}

fn cmd_show(table: &Path, filter: Option<&str>, limit: usize, key: Option<&str>) -> CfrResult<()> {
    let store = InfoSetStore::load(table)?;

    if let Some(text) = key {
        let key: InfoSetKey = text.parse()?;
        println!();
        println!("  {}", key.to_string().bold());
        match store.get(&key) {
            None => println!("  {}", "not in table (plays uniformly)".dimmed()),
            Some(node) => {
                println!();
                println!("  {}", "Average strategy".cyan().bold());
                for (a, p) in node.average_strategy().iter().enumerate() {
                    println!("    action {:>2}  {}", a, probability_bar(*p, 30));
                }
                println!();
                println!("  {}", "Current strategy".cyan().bold());
                println!("    {}", strategy_display(&node.current_strategy()));
            }
        }
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  {} {} information sets in {}",
        "Table".bold(),
        store.len(),
        table.display().to_string().dimmed()
    );
    println!();
    println!("{}", store_table(&store, filter, limit));
    println!();
    Ok(())
}

fn print_evaluation<G: Game, E: crate::infoset::HistoryEncoder>(eval: &Evaluator<'_, G, E>) -> CfrResult<()> {
    let values = eval.expected_values()?;
    let exploitability = eval.exploitability()?;
    print_section(
        "Expected value",
        &format!("p0 {:+.5}   p1 {:+.5}", values[0], values[1]),
    );
    print_section("Exploitability", &format!("{:.5}", exploitability));
    Ok(())
}

fn cmd_eval(game: &GameArgs, table: &Path) -> CfrResult<()> {
    let store = InfoSetStore::load(table)?;
    let kind = game.kind()?;
    let encoder = CardGameEncoder;
    if kind == GameKind::MiniGin {
        log::warn!("exact evaluation enumerates every mini-gin deal; keep the deck small");
    }
    match kind {
        GameKind::Rps => print_evaluation(&Evaluator::new(&game.rps()?, &encoder, &store))?,
        GameKind::Kuhn => print_evaluation(&Evaluator::new(&Kuhn::new(), &encoder, &store))?,
        GameKind::MiniGin => print_evaluation(&Evaluator::new(&game.mini_gin()?, &encoder, &store))?,
    }
    println!();
    Ok(())
}

fn cmd_play(game: &GameArgs, table: &Path, opponent: Option<&Path>, games: usize, seed: u64) -> CfrResult<()> {
    let store = InfoSetStore::load(table)?;
    let opponent_store = match opponent {
        Some(path) => InfoSetStore::load(path)?,
        None => InfoSetStore::new(),
    };
    match game.kind()? {
        GameKind::Rps => play(&game.rps()?, &store, &opponent_store, games, seed),
        GameKind::Kuhn => play(&Kuhn::new(), &store, &opponent_store, games, seed),
        GameKind::MiniGin => play(&game.mini_gin()?, &store, &opponent_store, games, seed),
    }
}

fn play<G: Game>(game: &G, store: &InfoSetStore, opponent: &InfoSetStore, games: usize, seed: u64) -> CfrResult<()> {
    let trained = PolicyPlayer::new(store, CardGameEncoder);
    let other = PolicyPlayer::new(opponent, CardGameEncoder);
    let mut rng = StdRng::seed_from_u64(seed);

    let first = play_match(game, [&trained, &other], games, &mut rng)?;
    let second = play_match(game, [&other, &trained], games, &mut rng)?;

    println!();
    println!("  {} {} games per seating", "Match".bold(), games);
    println!();
    println!(
        "{}",
        match_table(&[
            ("trained as p0", &first, Player::First),
            ("trained as p1", &second, Player::Second),
        ])
    );

    let mean = (first.mean(Player::First) + second.mean(Player::Second)) / 2.0;
    println!();
    if mean >= 0.0 {
        print_success(&format!("  Trained table averages {:+.4} per game", mean));
    } else {
        println!("  Trained table averages {}", format!("{:+.4}", mean).red().bold());
    }
    println!();
    Ok(())
}
