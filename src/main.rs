//! # commitgate CLI Entry Point
//!
//! Parses arguments with clap, runs the gate over the selected files, prints
//! the report and writes it to disk. The exit code is 1 when any check failed.

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commitgate::checker::Status;
use commitgate::config;
use commitgate::gate::{self, GateOptions};
use commitgate::probe;
use commitgate::report::ReportFormat;
use commitgate::selection::{self, SelectionMode};

#[derive(Parser, Debug)]
#[command(name = "commitgate")]
#[command(about = "Run formatters, linters and scanners before a commit", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(group(ArgGroup::new("selection").multiple(false)))]
struct Cli {
    /// Check every file tracked in the index
    #[arg(long, group = "selection")]
    check_git_tree: bool,
    /// Check files changed since HEAD, staged or not
    #[arg(long, group = "selection")]
    check_edited_files: bool,
    /// Check staged files (default)
    #[arg(long, group = "selection")]
    check_staged: bool,
    /// Number of checks run in parallel
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Where to write the report
    #[arg(short = 'o', long)]
    report: Option<PathBuf>,
    /// Report file format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
    /// Configuration file to use instead of the discovered one
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Show debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn mode(&self) -> SelectionMode {
        if self.check_git_tree {
            SelectionMode::Tree
        } else if self.check_edited_files {
            SelectionMode::Edited
        } else {
            SelectionMode::Staged
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("commitgate=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commitgate=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose);
    tracing::debug!("commitgate starting with args: {:?}", cli);

    let cwd = std::env::current_dir()?;
    let (repo, root) = selection::open_repo(&cwd)?;
    let config = config::load_config(&root, cli.config.as_deref())?;

    let opts = GateOptions {
        mode: cli.mode(),
        jobs: cli.jobs,
        search_path: probe::env_search_path(),
        show_progress: true,
    };

    println!(
        "{} Checking {} files in {}",
        "🔍".cyan(),
        opts.mode.to_string().bold(),
        root.display()
    );

    let run = gate::run_gate(&repo, &root, &config, &opts)?;
    let report = &run.report;

    if run.files.is_empty() {
        println!("   {} no {} files selected", "i".blue(), opts.mode);
    } else {
        println!(
            "   {} {} file(s): {} C/C++, {} Python",
            "i".blue(),
            run.files.all.len(),
            run.files.cpp.len(),
            run.files.python.len()
        );
    }

    println!();
    print!("{}", report.render());
    println!();

    let report_path = cli.report.unwrap_or_else(|| root.join(&config.report));
    report.write(&report_path, cli.format)?;

    let counts = format!(
        "{} passed, {} warnings, {} failed, {} skipped",
        report.count(Status::Pass),
        report.count(Status::Warn),
        report.count(Status::Fail),
        report.count(Status::Skip)
    );
    if report.has_failures() {
        println!(
            "{} Commit blocked: {} in {:.2}s",
            "x".red().bold(),
            counts,
            run.elapsed.as_secs_f64()
        );
    } else {
        println!(
            "{} Ready to commit: {} in {:.2}s",
            "✓".green().bold(),
            counts,
            run.elapsed.as_secs_f64()
        );
    }
    println!("   {} {}", "Report:".dimmed(), report_path.display());

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
