//! SSV Rewards CLI
//!
//! Computes exact token reward distributions from round points and rolls
//! monthly validator rewards up into running totals.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use ssv_rewards_aggregator::FileRewardSource;
use ssv_rewards_app::{
    run_calc, run_monthly, run_sum, App, AppBuilder, CalcJob, MonthlyJob, RoundOutput, RoundSpec,
    SumJob, DEFAULT_SUM_LABEL,
};
use ssv_rewards_core::{Month, MonthRange, PerformanceProvider};
use ssv_rewards_distribution::RemainderPolicy;
use ssv_rewards_export::LedgerWriter;

/// SSV Rewards - exact reward distribution and monthly aggregation
#[derive(Parser)]
#[command(name = "ssv-rewards")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to ./ssv-rewards.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory outputs are written to (overrides the settings file)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Distribute round reward pools by points and merge the rounds
    Calc {
        /// Round as LABEL:AMOUNT:POINTS_JSON (amount in base units)
        #[arg(short, long = "round", required = true)]
        rounds: Vec<RoundSpec>,

        /// Who absorbs the rounding remainder
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Label of the merged ledger
        #[arg(long)]
        merged_label: Option<String>,
    },

    /// Merge points tables into one table
    Sum {
        /// Points JSON file (two or more)
        #[arg(short, long = "points", required = true, num_args = 1..)]
        points: Vec<PathBuf>,

        /// Label of the summed table
        #[arg(short, long, default_value = DEFAULT_SUM_LABEL)]
        label: String,
    },

    /// Aggregate monthly validator rewards into running totals
    Monthly {
        /// First month, for example 2023-10
        #[arg(long)]
        from: Month,

        /// Last month (inclusive), for example 2023-11
        #[arg(long)]
        to: Month,

        /// Performance provider (beaconcha, e2m)
        #[arg(long)]
        provider: Option<PerformanceProvider>,

        /// Minimum attestations in a day to count as active
        #[arg(long)]
        min_attestations: Option<u32>,

        /// Directory of exported reward query results
        #[arg(long)]
        source: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Last participant in identity order absorbs the remainder
    LastParticipant,
    /// Largest division remainders get one extra unit each
    LargestRemainder,
}

impl From<PolicyArg> for RemainderPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LastParticipant => RemainderPolicy::LastParticipant,
            PolicyArg::LargestRemainder => RemainderPolicy::LargestRemainder,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut builder = AppBuilder::new()
        .name("ssv-rewards")
        .version(env!("CARGO_PKG_VERSION"))
        .verbose(cli.verbose);
    if let Some(path) = cli.config {
        builder = builder.config_path(path);
    }
    if let Some(dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    let app = builder.build().context("Failed to initialize")?;

    match cli.command {
        Commands::Calc {
            rounds,
            policy,
            merged_label,
        } => calc(&app, rounds, policy, merged_label),
        Commands::Sum { points, label } => sum(&app, points, label),
        Commands::Monthly {
            from,
            to,
            provider,
            min_attestations,
            source,
        } => monthly(&app, from, to, provider, min_attestations, source),
    }
}

fn calc(
    app: &App,
    rounds: Vec<RoundSpec>,
    policy: Option<PolicyArg>,
    merged_label: Option<String>,
) -> Result<()> {
    let settings = app.settings();
    let labels: Vec<String> = rounds.iter().map(|r| r.label.clone()).collect();
    let mut job = CalcJob::new(rounds, &settings);
    if let Some(policy) = policy {
        job.policy = policy.into();
    }
    if let Some(label) = merged_label {
        job.merged_label = label;
    }

    let writer = LedgerWriter::new(&settings.output.dir);
    let report = run_calc(&job, &writer)
        .with_context(|| format!("Failed to calculate rounds {}", labels.join(", ")))?;

    for output in &report.rounds {
        print_output(output);
    }
    if let Some(merged) = &report.merged {
        print_output(merged);
    }
    Ok(())
}

fn sum(app: &App, points: Vec<PathBuf>, label: String) -> Result<()> {
    let settings = app.settings();
    let job = SumJob::new(points).with_label(label);
    let writer = LedgerWriter::new(&settings.output.dir);
    let output = run_sum(&job, &writer)
        .with_context(|| format!("Failed to sum points into {}", job.label))?;
    print_output(&output);
    Ok(())
}

fn monthly(
    app: &App,
    from: Month,
    to: Month,
    provider: Option<PerformanceProvider>,
    min_attestations: Option<u32>,
    source: Option<PathBuf>,
) -> Result<()> {
    let settings = app.settings();
    let range = MonthRange::new(from, to).context("Invalid month range")?;
    let mut job = MonthlyJob::new(range, &settings).context("Invalid monthly settings")?;
    if let Some(provider) = provider {
        job.provider = provider;
    }
    if let Some(min) = min_attestations {
        job.minimum_daily_attestations = min;
    }
    let source_dir = source.unwrap_or_else(|| settings.monthly.source_dir.clone());
    info!("Reading reward query results from {:?}", source_dir);

    let report = run_monthly(&job, &FileRewardSource::new(source_dir))
        .with_context(|| format!("Failed to calculate monthly rewards {from} to {to}"))?;

    println!();
    println!("Summary");
    print!("{}", report.summary);
    println!();
    println!(
        "{} owners, {} validators, {} SSV in total",
        report.owners,
        report.validators,
        job.scale.format(report.total_reward)
    );
    Ok(())
}

fn print_output(output: &RoundOutput) {
    println!(
        "{}: {} across {} participants -> {} (sha256 {})",
        output.label,
        output.total,
        output.participants,
        output.path.display(),
        output.fingerprint
    );
}
