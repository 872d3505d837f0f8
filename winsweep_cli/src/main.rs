use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use winsweep_core::envutil::expand_env;
use winsweep_core::path::{has_glob_chars, is_bare_root, is_drive_rooted, normalize};
use winsweep_core::{
    admin, config, format_size, Category, CleanTarget, DeletionEngine, RiskLevel, SafetyValidator,
    SweepError, Whitelist,
};

#[derive(Parser)]
#[command(author, version, about = "Safety-gated disk cleanup for Windows", long_about = None)]
struct Cli {
    /// Whitelist file (defaults to %APPDATA%\winsweep\whitelist.txt)
    #[arg(long, global = true, value_name = "FILE")]
    whitelist_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure reclaimable space per catalog target without deleting
    Scan {
        /// Restrict to one category: user, system, browser, dev
        #[arg(long)]
        category: Option<Category>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete catalog targets that pass the safety checks
    Clean {
        /// Restrict to one category: user, system, browser, dev
        #[arg(long)]
        category: Option<Category>,
        /// Report what would be removed without touching anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage patterns that cleaning will never touch
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// Add a pattern (validated before it is stored)
    Add { pattern: String },
    /// Remove a previously added pattern
    Remove { pattern: String },
    /// Print stored patterns in order
    List,
}

#[derive(Serialize)]
struct TargetReport {
    name: &'static str,
    category: Category,
    risk: RiskLevel,
    bytes: u64,
    items: usize,
}

#[derive(Serialize)]
struct ScanReport {
    targets: Vec<TargetReport>,
    total_bytes: u64,
    total_items: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let whitelist_file = cli
        .whitelist_file
        .map(|p| dunce::canonicalize(&p).unwrap_or(p))
        .unwrap_or_else(default_whitelist_file);

    let whitelist = Arc::new(
        Whitelist::load(&whitelist_file)
            .with_context(|| format!("cannot load whitelist from {}", whitelist_file.display()))?,
    );

    match cli.command {
        Commands::Scan { category, json } => {
            let engine = build_engine(whitelist);
            let targets = select_targets(category);
            let report = scan_targets(&engine, &targets);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_scan_report(&report);
            }
        }
        Commands::Clean { category, dry_run } => {
            let engine = build_engine(whitelist);
            let targets = clean_selection(category, dry_run)?;
            run_clean(&engine, &targets, dry_run);
        }
        Commands::Whitelist { action } => run_whitelist(&whitelist, action)?,
    }

    Ok(())
}

fn default_whitelist_file() -> PathBuf {
    let base = env::var("APPDATA")
        .or_else(|_| env::var("XDG_CONFIG_HOME"))
        .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
        .unwrap_or_else(|_| String::from("."));
    PathBuf::from(base).join("winsweep").join("whitelist.txt")
}

fn build_engine(whitelist: Arc<Whitelist>) -> DeletionEngine {
    DeletionEngine::new(SafetyValidator::with_system_defaults(whitelist))
}

fn select_targets(category: Option<Category>) -> Vec<CleanTarget> {
    match category {
        Some(cat) => config::targets_by_category(cat),
        None => config::clean_targets().to_vec(),
    }
}

/// Picks the targets a clean run may touch. An explicit system-category
/// request without elevation is an error; an implicit all-category run
/// drops system targets instead so user cleanup still works. Dry runs
/// only read and are never gated.
fn clean_selection(category: Option<Category>, dry_run: bool) -> Result<Vec<CleanTarget>> {
    let mut targets = select_targets(category);
    if dry_run || admin::is_elevated() {
        return Ok(targets);
    }
    if category == Some(Category::System) {
        admin::require_admin("clean system targets")?;
    }
    let before = targets.len();
    targets.retain(|t| t.category != Category::System);
    if targets.len() < before {
        println!(
            "{}",
            "Skipping system targets (not elevated; re-run as administrator to include them)"
                .yellow()
        );
    }
    Ok(targets)
}

fn scan_targets(engine: &DeletionEngine, targets: &[CleanTarget]) -> ScanReport {
    let mut reports: Vec<TargetReport> = targets
        .par_iter()
        .map(|target| {
            let (bytes, items) = sweep_target(engine, target, true);
            TargetReport {
                name: target.name,
                category: target.category,
                risk: target.risk,
                bytes,
                items,
            }
        })
        .collect();
    reports.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    let total_bytes = reports.iter().map(|r| r.bytes).sum();
    let total_items = reports.iter().map(|r| r.items).sum();
    ScanReport {
        targets: reports,
        total_bytes,
        total_items,
    }
}

/// Measures or removes everything one catalog target covers.
fn sweep_target(engine: &DeletionEngine, target: &CleanTarget, dry_run: bool) -> (u64, usize) {
    let mut bytes = 0u64;
    let mut items = 0usize;
    for raw in target.paths {
        let (freed, removed) = sweep_pattern(engine, raw, dry_run);
        bytes += freed;
        items += removed;
    }
    (bytes, items)
}

/// Resolves one catalog pattern and routes it to the engine: a leaf glob
/// becomes a directory sweep, anything else is removed as a single path.
fn sweep_pattern(engine: &DeletionEngine, raw: &str, dry_run: bool) -> (u64, usize) {
    let expanded = expand_env(raw);
    let normalized = normalize(&expanded);
    // Catalog paths are absolute once their variables resolve; a relative
    // remainder means an unset variable, not a real target.
    if !(is_drive_rooted(&normalized) || normalized.starts_with('/')) {
        debug!("skipping unresolved catalog pattern {raw}");
        return (0, 0);
    }
    match normalized.rsplit_once('/') {
        Some((dir, leaf)) if has_glob_chars(leaf) => {
            // An unset environment reference leaves the glob dangling off
            // an empty or bare-root directory; never sweep those.
            if dir.is_empty() || is_bare_root(dir) || has_glob_chars(dir) {
                debug!("skipping unresolved catalog pattern {raw}");
                return (0, 0);
            }
            match engine.safe_clean_dir(Path::new(dir), leaf, dry_run) {
                Ok(pair) => pair,
                Err(err) => {
                    report_skip(raw, &err);
                    (0, 0)
                }
            }
        }
        _ => match engine.safe_delete(Path::new(&normalized), dry_run) {
            Ok(0) => (0, 0),
            Ok(freed) => (freed, 1),
            Err(err) => {
                report_skip(raw, &err);
                (0, 0)
            }
        },
    }
}

fn report_skip(pattern: &str, err: &SweepError) {
    if err.is_whitelist_skip() {
        debug!("whitelisted, leaving {pattern} alone");
    } else if err.is_safety_rejection() {
        println!("  {} {pattern} ({err})", "protected".yellow());
    } else {
        warn!("cannot process {pattern}: {err}");
    }
}

fn print_scan_report(report: &ScanReport) {
    if report.targets.is_empty() {
        println!("No matching targets.");
        return;
    }
    println!(
        "{} {} {} {} {}",
        format!("{:<24}", "TARGET").bold(),
        format!("{:<8}", "CATEGORY").bold(),
        format!("{:<7}", "RISK").bold(),
        format!("{:>12}", "SIZE").bold(),
        "ITEMS".bold()
    );
    for entry in &report.targets {
        let risk_cell = format!("{:<7}", entry.risk.as_str());
        let risk_cell = match entry.risk {
            RiskLevel::Low => risk_cell.green(),
            RiskLevel::Medium => risk_cell.yellow(),
            RiskLevel::High => risk_cell.red(),
        };
        println!(
            "{:<24} {:<8} {} {:>12}  {}",
            entry.name,
            entry.category.as_str(),
            risk_cell,
            format_size(entry.bytes),
            entry.items
        );
    }
    println!();
    println!(
        "Reclaimable: {} across {} item(s)",
        format_size(report.total_bytes).bold().green(),
        report.total_items
    );
}

fn run_clean(engine: &DeletionEngine, targets: &[CleanTarget], dry_run: bool) {
    let label = if dry_run { "Would free" } else { "Freed" };
    let mut total_bytes = 0u64;
    let mut total_items = 0usize;

    for target in targets {
        let (bytes, items) = sweep_target(engine, target, dry_run);
        if items > 0 {
            println!(
                "  {} {label} {} ({items} item(s))",
                format!("{:<24}", target.name).bold(),
                format_size(bytes).green()
            );
        }
        total_bytes += bytes;
        total_items += items;
    }

    if total_items == 0 {
        println!("Nothing to clean.");
    } else {
        println!();
        println!(
            "{label} {} across {total_items} item(s)",
            format_size(total_bytes).bold().green()
        );
        if dry_run {
            println!("Dry run: nothing was deleted.");
        }
    }
}

fn run_whitelist(whitelist: &Whitelist, action: WhitelistAction) -> Result<()> {
    match action {
        WhitelistAction::Add { pattern } => {
            whitelist.add(&pattern)?;
            whitelist.save()?;
            println!("{} {pattern}", "Added".green());
        }
        WhitelistAction::Remove { pattern } => {
            whitelist.remove(&pattern)?;
            whitelist.save()?;
            println!("{} {pattern}", "Removed".green());
        }
        WhitelistAction::List => {
            let patterns = whitelist.list();
            if patterns.is_empty() {
                println!("Whitelist is empty.");
            } else {
                for pattern in &patterns {
                    println!("  {pattern}");
                }
                println!();
                println!(
                    "{} pattern(s) in {}",
                    patterns.len(),
                    whitelist.file_path().display()
                );
            }
        }
    }
    Ok(())
}
