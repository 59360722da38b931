//! schemaguard CLI
//!
//! Reconciles the tables described in a schema document against a PostgreSQL database.
//! Suitable for deploy scripts and CI/CD pipelines: the exit code is non-zero on any failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use schemaguard::{
    connect, current_database, DatabaseConfig, MayPostgresExecutor, Phase, ReconcileReport,
    Reconciler, TableSpec,
};
use schemaguard_cli::{fresh_table_plan, load};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "schemaguard")]
#[command(about = "Declarative, data-preserving table reconciliation for PostgreSQL")]
#[command(version)]
struct Cli {
    /// Database connection URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or converge every table in the schema document
    Apply {
        /// Schema document (TOML, or JSON with a .json extension)
        file: PathBuf,

        /// Run everything, print the statements, then roll back
        #[arg(long)]
        dry_run: bool,
    },

    /// Drop every table in the schema document that exists, last one first
    Drop {
        file: PathBuf,

        /// Report what would be dropped, then roll back
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse and validate the schema document without connecting
    Check { file: PathBuf },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let result = match &cli.command {
        Commands::Check { file } => handle_check(file, cli.quiet),
        Commands::Apply { file, dry_run } => {
            with_database(&cli, file, |executor, tables| handle_apply(executor, tables, *dry_run, cli.quiet))
        }
        Commands::Drop { file, dry_run } => {
            with_database(&cli, file, |executor, tables| handle_drop(executor, tables, *dry_run, cli.quiet))
        }
    };

    match result {
        Ok(()) => {
            if !cli.quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// `--database-url`, then `SCHEMAGUARD_DATABASE_URL`, then `DATABASE_URL`, then the config file.
fn resolve_database(flag: Option<&str>) -> Result<(String, Option<String>)> {
    let config = DatabaseConfig::load().context("failed to load database configuration")?;
    let url = flag
        .map(str::to_string)
        .or_else(|| std::env::var("SCHEMAGUARD_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| config.url.clone());
    Ok((url, config.name))
}

fn with_database(
    cli: &Cli,
    file: &Path,
    run: impl FnOnce(&MayPostgresExecutor, Vec<TableSpec>) -> Result<()>,
) -> Result<()> {
    let mut tables = load(file).with_context(|| format!("invalid schema document {}", file.display()))?;

    let (url, database_name) = resolve_database(cli.database_url.as_deref())?;
    let executor = connect(&url).context("error connecting to database")?;

    if tables.iter().any(|t| t.database.is_empty()) {
        let name = match database_name {
            Some(name) => name,
            None => current_database(&executor).context("failed to read the database name")?,
        };
        log::debug!("Scoping catalog lookups to database {}", name);
        for table in tables.iter_mut().filter(|t| t.database.is_empty()) {
            table.database = name.clone();
        }
    }

    run(&executor, tables)
}

fn handle_check(file: &Path, quiet: bool) -> Result<()> {
    let tables = load(file).with_context(|| format!("invalid schema document {}", file.display()))?;

    for table in &tables {
        let plan = fresh_table_plan(table)?;
        if quiet {
            continue;
        }
        println!(
            "\n📋 {}.{} ({} columns, {} constraints{})",
            table.schema,
            table.name.bold(),
            table.columns.len(),
            table.constraints.len(),
            if table.autocommit { ", autocommit" } else { "" }
        );
        for column in &table.columns {
            let steps: Vec<_> = plan
                .iter()
                .filter_map(|s| match &s.phase {
                    Phase::Column { column: c, step } if *c == column.name => Some(step.as_str()),
                    _ => None,
                })
                .collect();
            println!("  {} {} → {}", column.name.cyan(), column.datatype, steps.join(", "));
        }
    }
    Ok(())
}

fn handle_apply(
    executor: &MayPostgresExecutor,
    tables: Vec<TableSpec>,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let reconciler = Reconciler::new();
    let mut tx = executor.begin()?;

    for mut table in tables {
        if dry_run {
            table.autocommit = false;
        }
        // an autocommitted table ends the transaction; the next one gets a fresh one
        if tx.is_closed() {
            tx = executor.begin()?;
        }

        let report = reconciler
            .reconcile(&table, &mut tx)
            .with_context(|| format!("table {} was not reconciled", table.name))?;
        if !quiet {
            print_report(&report, dry_run);
        }
    }

    if !tx.is_closed() {
        if dry_run {
            tx.rollback()?;
            if !quiet {
                println!("\n{}", "Dry run: every statement above was rolled back".yellow());
            }
        } else {
            tx.commit()?;
        }
    }
    Ok(())
}

fn handle_drop(
    executor: &MayPostgresExecutor,
    tables: Vec<TableSpec>,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let reconciler = Reconciler::new();
    let mut tx = executor.begin()?;
    let mut dropped = 0;

    for table in tables.iter().rev() {
        let was_dropped = reconciler
            .drop_table(table, &mut tx)
            .with_context(|| format!("table {} was not dropped", table.name))?;
        if was_dropped {
            dropped += 1;
        }
        if !quiet {
            let status = if was_dropped { "dropped".red() } else { "absent".dimmed() };
            println!("  {} {}", table.name.bold(), status);
        }
    }

    if dry_run {
        tx.rollback()?;
        if !quiet {
            println!("\nWould drop {} table(s); rolled back", dropped);
        }
    } else {
        tx.commit()?;
        if !quiet {
            println!("\nDropped {} table(s)", dropped);
        }
    }
    Ok(())
}

fn print_report(report: &ReconcileReport, dry_run: bool) {
    let header = if report.table_created {
        format!("{} (created)", report.table).green().bold()
    } else if report.changed_columns() {
        format!("{} (updated)", report.table).yellow().bold()
    } else {
        format!("{} (up to date)", report.table).normal()
    };
    println!("\n📦 {}", header);

    if dry_run || log::log_enabled!(log::Level::Debug) {
        for statement in &report.executed {
            println!("  {} {}", format!("[{}]", statement.phase).dimmed(), statement.sql);
        }
    } else {
        println!("  {} statement(s) executed", report.executed.len());
    }

    if report.committed() {
        println!("  {}", "committed".green());
    }
}
