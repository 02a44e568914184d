//! reqcov - Measure requirements coverage of source and test code
//!
//! reqcov scans source and test trees for coverage tags (`@Req(ID)` by
//! default), reads the declared requirements from a file or a Redmine
//! project, and reports which requirements are implemented, tested, both,
//! neither, or tagged against an outdated revision.

use clap::{ArgAction, Parser};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use reqcov::config::load_config;
use reqcov::output::{OutputFormat, render_result};
use reqcov::{CONFIG_PATH, find_project_root, project_root_for_config};
use reqcov_core::pipeline;
use std::path::PathBuf;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to config file (default: .config/reqcov/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only print the summary line (exit non-zero if failing)
    #[arg(long)]
    check: bool,

    /// Minimum coverage percentage to pass (default: 0)
    #[arg(long)]
    threshold: Option<f64>,

    /// With --check, also fail on orphan tags and stale requirements
    #[arg(long)]
    strict: bool,

    /// Verbosity (-v, -vv, -vvv); -v also lists every verdict with its tags
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    run(args)
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => find_project_root()?.join(CONFIG_PATH),
    };
    let config = load_config(&config_path)?;

    // Relative paths in the config resolve against its directory
    let config_dir = config_path
        .parent()
        .ok_or_else(|| eyre::eyre!("Config path has no parent directory"))?;
    let project_root = project_root_for_config(&config_path);

    let run_config = config
        .run_config(config_dir, &project_root)
        .wrap_err_with(|| format!("Invalid config {}", config_path.display()))?;
    let source = config
        .requirement_source(config_dir)
        .wrap_err_with(|| format!("Invalid config {}", config_path.display()))?;

    eprintln!(
        "{} Reading requirements from {}...",
        "->".blue().bold(),
        source.location().cyan()
    );
    eprintln!(
        "{} Scanning {} and {}...",
        "->".blue().bold(),
        run_config.source_root.display(),
        run_config.test_root.display()
    );

    let result = pipeline::run(&run_config, source.as_ref())?;

    eprintln!(
        "   Found {} requirements, {} orphan tags",
        result.summary.total.to_string().green(),
        result.orphans.len().to_string().yellow()
    );
    if !result.warnings.is_empty() {
        eprintln!(
            "{} {} files skipped",
            "!".yellow().bold(),
            result.warnings.len()
        );
    }

    let threshold = args.threshold.unwrap_or(0.0);

    if args.check {
        let passing = result.is_passing(threshold)
            && !(args.strict && (!result.orphans.is_empty() || result.summary.stale > 0));
        if passing {
            eprintln!(
                "{} {}% coverage ({}/{})",
                "OK".green().bold(),
                result.summary.percentage,
                result.summary.covered,
                result.summary.total
            );
            return Ok(());
        }
        eyre::bail!(
            "coverage check failed: {}% ({}/{} covered, threshold {}%, {} orphan tags, {} stale)",
            result.summary.percentage,
            result.summary.covered,
            result.summary.total,
            threshold,
            result.orphans.len(),
            result.summary.stale
        );
    }

    let output = render_result(&result, args.format, args.verbose > 0)?;
    print!("{}", output);

    Ok(())
}
