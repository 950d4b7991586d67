//! sapscope - batch classifier and stats for Super Auto Pets win screenshots
//!
//! Points the classification pipeline at a directory of `.png` screenshots,
//! caches every per-file outcome so later runs are incremental, and prints
//! the aggregate statistics.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Result cache: $XDG_DATA_HOME/sapscope/results.json
//! - Logs: $XDG_STATE_HOME/sapscope/sapscope.log
//! - Config: $XDG_CONFIG_HOME/sapscope/config.toml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sapscope_core::cache::ResultCache;
use sapscope_core::oracle::{ArenaBridge, BuiltinOracle};
use sapscope_core::pipeline::ClassificationPipeline;
use sapscope_core::sink::RemoteSink;
use sapscope_core::source::DirSource;
use sapscope_core::stats::{weekday_name, WinStats};
use sapscope_core::{Config, ScanReport, ScreenshotResult};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sapscope")]
#[command(about = "Classify Super Auto Pets win screenshots and report stats")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory of screenshots, classifying anything not yet cached
    Scan {
        /// Directory containing .png screenshots
        dir: PathBuf,

        /// Minimum date (YYYYMMDD) for files not yet classified; cached
        /// files are exempt
        #[arg(long)]
        since: Option<i64>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Aggregate everything already in the result cache (no oracle, no source)
    Report {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = sapscope_core::logging::init(&config.logging).ok();

    match args.command {
        Command::Scan { dir, since, json } => scan(&config, dir, since, json),
        Command::Report { json } => report(json),
    }
}

fn scan(config: &Config, dir: PathBuf, since: Option<i64>, json: bool) -> Result<()> {
    let min_date = since.unwrap_or(config.scan.min_date);
    tracing::info!(dir = %dir.display(), min_date, "sapscope scan starting");

    // Without a working oracle no classification is possible; show the
    // diagnostic in place of a report.
    let oracle = BuiltinOracle::with_layout(config.oracle.initial_pages, config.oracle.max_pages);
    let mut bridge = match ArenaBridge::new(Box::new(oracle), config.oracle.max_pages) {
        Ok(bridge) => bridge,
        Err(e) => {
            tracing::error!(error = %e, "Oracle unavailable");
            anyhow::bail!("oracle unavailable, classification disabled: {}", e);
        }
    };
    println!("oracle self-test returned {}", bridge.self_test_value());

    let cache_path = Config::cache_path();
    let mut cache = ResultCache::load(&cache_path);
    println!("cache: {} ({} entries)", cache_path.display(), cache.len());

    let sink = RemoteSink::new(&config.sink);
    let source = DirSource::new(dir);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let scan_report = ClassificationPipeline::new(&mut bridge, &mut cache, &sink)
        .run_with_progress(&source, min_date, |current, total, file_key| {
            if pb.length() == Some(0) {
                pb.set_length(total as u64);
            }
            pb.set_position(current as u64);
            pb.set_message(file_key.to_string());
        })
        .context("scan failed")?;

    pb.finish_and_clear();

    let stats = WinStats::from_results(&scan_report.results);
    if json {
        print_json(&stats, Some(&scan_report))?;
    } else {
        print_terminal(&stats, &scan_report.results);
        print_summary(&scan_report);
    }

    Ok(())
}

fn report(json: bool) -> Result<()> {
    let cache = ResultCache::load(&Config::cache_path());

    let mut results: Vec<ScreenshotResult> = cache.results().filter(|r| r.valid).cloned().collect();
    results.sort_by(|a, b| a.file_key.cmp(&b.file_key));

    let stats = WinStats::from_results(&results);
    if json {
        print_json(&stats, None)?;
    } else {
        print_terminal(&stats, &results);
    }

    Ok(())
}

fn print_json(stats: &WinStats, scan_report: Option<&ScanReport>) -> Result<()> {
    let value = match scan_report {
        Some(report) => serde_json::json!({
            "run_id": report.run_id,
            "summary": report.summary,
            "stats": stats,
        }),
        None => serde_json::json!({ "stats": stats }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_terminal(stats: &WinStats, results: &[ScreenshotResult]) {
    println!();
    println!("total wins: {}", stats.total_wins);
    println!("wins without bandage: {}", stats.wins_without_bandage);
    println!("wins with bandage: {}", stats.wins_with_bandage);

    println!();
    for (ordinal, wins) in stats.day_of_week.iter().enumerate() {
        println!("wins on {}: {}", weekday_name(ordinal), wins);
    }

    if !stats.turn_histogram.is_empty() {
        println!();
        for bucket in &stats.turn_histogram {
            println!("wins on turn {}: {}", bucket.turn_count, bucket.wins);
        }
    }

    if !stats.date_series.is_empty() {
        println!();
        println!("{:<12} {:>5} {:>9}", "date", "wins", "avg turn");
        for bucket in &stats.date_series {
            println!(
                "{:<12} {:>5} {:>9.1}",
                bucket.date, bucket.win_count, bucket.avg_turn_count
            );
        }
    }

    if !results.is_empty() {
        println!();
        for r in results {
            let turn = r
                .turn_count
                .map(|t| format!("turn {}", t))
                .unwrap_or_else(|| "turn unknown".to_string());
            let bandage = if r.has_bandage { ", bandage" } else { "" };
            println!(
                "  {} won @ {} with {} hearts{}",
                r.file_key, turn, r.heart_count, bandage
            );
        }
    }
}

fn print_summary(report: &ScanReport) {
    let s = &report.summary;
    println!();
    println!(
        "scanned {} file(s): {} classified, {} cache hit(s), {} known non-screenshot(s), {} below date gate",
        s.files_total, s.classified, s.cache_hits, s.cached_invalid, s.skipped_by_date
    );
    if !s.errors.is_empty() {
        println!("{} file(s) failed:", s.errors.len());
        for (file_key, message) in &s.errors {
            println!("  {}: {}", file_key, message);
        }
    }
}
