//! `roster` command-line entry point.
//!
//! # Responsibility
//! - Load side tables and raw rows, run the resolution engine, and write
//!   the panel plus its audit side tables.
//! - Keep every domain rule in `roster_core`; this crate only adapts files.

mod io;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use roster_core::{
    core_version, default_log_level, init_logging, open_db, person_years, AuditRepository, Engine,
    EngineConfig, Granularity, NameLexicon, NameOverrides, Observation, Quarter,
    RecordedResolver, Resolution, ResolutionService, SqliteAuditRepository, UnitDirectory,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Entity resolution for OCR'd magistrate rosters")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve raw roster rows into a person-period panel.
    Run(RunArgs),
    /// List runs recorded in an audit database.
    Runs(RunsArgs),
    /// Print the core version.
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Raw rows: `nume,prenume,instituţie,an,lună`.
    #[arg(long)]
    input: PathBuf,
    /// Name-token category dictionary (JSON).
    #[arg(long)]
    lexicon: PathBuf,
    /// Unit → `[branch, sub_branch, local]` directory (JSON).
    #[arg(long)]
    units: PathBuf,
    /// Resolved panel destination.
    #[arg(long)]
    output: PathBuf,
    /// Hand-verified name overrides (JSON).
    #[arg(long)]
    overrides: Option<PathBuf>,
    /// Engine bounds and thresholds (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Decisions recorded in an earlier review round (JSON).
    #[arg(long)]
    decisions: Option<PathBuf>,
    /// SQLite database the run's audit trail is appended to.
    #[arg(long)]
    audit_db: Option<PathBuf>,
    /// Change-log CSV destination.
    #[arg(long)]
    change_log: Option<PathBuf>,
    /// Review side-table CSV destination.
    #[arg(long)]
    review: Option<PathBuf>,
    /// Write a person-year panel sampled from this quarter (1-4) instead of
    /// the person-month panel. Needs a month-level roster.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    person_year_quarter: Option<u8>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Args, Debug)]
struct RunsArgs {
    #[arg(long)]
    audit_db: PathBuf,
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Runs(args) => list_runs(&args),
        Command::Version => {
            println!("roster {}", core_version());
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    if let Some(log_dir) = &args.log_dir {
        start_logging(log_dir, args.log_level.as_deref())?;
    }

    let lexicon = NameLexicon::load(&args.lexicon)
        .with_context(|| format!("loading lexicon {}", args.lexicon.display()))?;
    let units = UnitDirectory::load(&args.units)
        .with_context(|| format!("loading unit directory {}", args.units.display()))?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let overrides = match &args.overrides {
        Some(path) => NameOverrides::load(path)
            .with_context(|| format!("loading overrides {}", path.display()))?,
        None => NameOverrides::default(),
    };

    let mut engine = Engine::new(lexicon, units.clone(), config).with_overrides(overrides);
    if let Some(path) = &args.decisions {
        let resolver = RecordedResolver::load(path)
            .with_context(|| format!("loading decisions {}", path.display()))?;
        info!(
            "event=decisions_loaded module=cli count={}",
            resolver.len()
        );
        engine = engine.with_resolver(resolver);
    }

    let rows = io::read_observations(&args.input)?;
    let resolution = match &args.audit_db {
        Some(path) => {
            let conn = open_db(path)
                .with_context(|| format!("opening audit database {}", path.display()))?;
            let service = ResolutionService::new(engine, SqliteAuditRepository::try_new(&conn)?);
            service.resolve(rows)?
        }
        None => engine.run(rows)?,
    };

    let sampled;
    let panel: &[Observation] = match args.person_year_quarter {
        Some(value) => {
            if resolution.granularity != Granularity::Month {
                bail!("--person-year-quarter needs a month-level roster");
            }
            let quarter =
                Quarter::new(value).ok_or_else(|| anyhow!("quarter must be 1-4, got {value}"))?;
            sampled = person_years(&resolution.rows, quarter);
            &sampled
        }
        None => &resolution.rows,
    };
    io::write_panel(&args.output, panel, &units)?;
    if let Some(path) = &args.change_log {
        resolution
            .change_log
            .write_csv(io::create_file(path)?)
            .with_context(|| format!("writing change log {}", path.display()))?;
    }
    if let Some(path) = &args.review {
        resolution
            .review
            .write_csv(io::create_file(path)?)
            .with_context(|| format!("writing review table {}", path.display()))?;
    }

    print_summary(&resolution);
    Ok(())
}

fn list_runs(args: &RunsArgs) -> Result<()> {
    let conn = open_db(&args.audit_db)
        .with_context(|| format!("opening audit database {}", args.audit_db.display()))?;
    let repo = SqliteAuditRepository::try_new(&conn)?;
    for run in repo.list_runs(Some(args.limit))? {
        println!(
            "{} started_at_ms={} granularity={:?} iterations={} termination={} rows={} persons={}",
            run.run_id,
            run.started_at_ms,
            run.granularity,
            run.iterations,
            run.termination.as_str(),
            run.row_count,
            run.person_count
        );
    }
    Ok(())
}

fn start_logging(log_dir: &Path, level: Option<&str>) -> Result<()> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| anyhow!("log dir {} is not valid UTF-8", log_dir.display()))?;
    init_logging(level.unwrap_or_else(|| default_log_level()), log_dir).map_err(|err| anyhow!(err))
}

fn print_summary(resolution: &Resolution) {
    println!(
        "run {}: {} rows, {} persons, {} iterations ({}), {} changes, {} review items",
        resolution.change_log.run_id(),
        resolution.rows.len(),
        resolution.person_count,
        resolution.iterations,
        resolution.termination.as_str(),
        resolution.change_log.len(),
        resolution.review.len()
    );
}
