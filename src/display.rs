use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{CardSet, Suit};
use crate::evaluate::MatchReport;
use crate::game::Player;
use crate::store::InfoSetStore;
use crate::trainer::TrainingReport;

pub fn probability_bar(p: f64, width: usize) -> String {
    let filled = ((p.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width - filled);
    let pct = format!("{:5.1}%", p * 100.0);

    if p >= 0.6 {
        format!("{} {}", bar.green(), pct)
    } else if p >= 0.3 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.dimmed(), pct)
    }
}

pub fn hand_display(hand: CardSet) -> String {
    if hand.is_empty() {
        return "-".dimmed().to_string();
    }
    hand.iter()
        .map(|card| {
            let text = card.pretty();
            match card.suit {
                Suit::Spades => text.white().to_string(),
                Suit::Hearts => text.red().to_string(),
                Suit::Diamonds => text.blue().to_string(),
                Suit::Clubs => text.green().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Probabilities to two decimals, the most likely action highlighted.
pub fn strategy_display(strategy: &[f64]) -> String {
    let best = strategy
        .iter()
        .enumerate()
        .fold(0, |best, (i, p)| if *p > strategy[best] { i } else { best });
    strategy
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let text = format!("{:.2}", p);
            if i == best {
                text.green().bold().to_string()
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stored information sets in key order, optionally filtered by a key
/// substring.
pub fn store_table(store: &InfoSetStore, filter: Option<&str>, limit: usize) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Information set".bold().to_string()),
        Cell::new("Hand"),
        Cell::new("Weight").set_alignment(CellAlignment::Right),
        Cell::new("Average strategy"),
    ]);

    let mut rows: Vec<_> = store
        .iter()
        .map(|(key, node)| (key.to_string(), key, node))
        .filter(|(text, _, _)| filter.map_or(true, |f| text.contains(f)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    for (text, key, node) in rows.into_iter().take(limit) {
        let weight: f64 = node.strategy_sum().iter().map(|w| w.max(0.0)).sum();
        table.add_row(vec![
            Cell::new(text),
            Cell::new(hand_display(key.hand())),
            Cell::new(format!("{:.1}", weight)),
            Cell::new(strategy_display(&node.average_strategy())),
        ]);
    }

    table.to_string()
}

pub fn training_table(game: &str, report: &TrainingReport) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric").set_alignment(CellAlignment::Left),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);

    table.add_row(vec![Cell::new("Game".bold().to_string()), Cell::new(game)]);
    table.add_row(vec![
        Cell::new("Iterations".bold().to_string()),
        Cell::new(report.iterations.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Total iterations".bold().to_string()),
        Cell::new(report.total_iterations.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Information sets".bold().to_string()),
        Cell::new(report.info_sets.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Time".bold().to_string()),
        Cell::new(format!("{:.2}s", report.elapsed_secs)),
    ]);
    if report.stopped_early {
        table.add_row(vec![
            Cell::new("Stopped early".bold().to_string()),
            Cell::new("yes".yellow().to_string()),
        ]);
    }

    table.to_string()
}

fn signed(value: f64) -> String {
    let text = format!("{:+.4}", value);
    if value >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// One row per seating, utilities from the trained policy's point of view.
pub fn match_table(rows: &[(&str, &MatchReport, Player)]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Seating".bold().to_string()),
        Cell::new("Games").set_alignment(CellAlignment::Right),
        Cell::new("Won").set_alignment(CellAlignment::Right),
        Cell::new("Lost").set_alignment(CellAlignment::Right),
        Cell::new("Drawn").set_alignment(CellAlignment::Right),
        Cell::new("Mean").set_alignment(CellAlignment::Right),
    ]);

    for (label, report, seat) in rows {
        table.add_row(vec![
            Cell::new(*label),
            Cell::new(report.games.to_string()),
            Cell::new(report.wins[seat.index()].to_string()),
            Cell::new(report.wins[seat.opponent().index()].to_string()),
            Cell::new(report.draws.to_string()),
            Cell::new(signed(report.mean(*seat))),
        ]);
    }

    table.to_string()
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
