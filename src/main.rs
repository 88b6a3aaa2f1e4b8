use clap::Parser;
use log::{error, info};
use rust_python_split_conflicts::error::ConflictError;
use rust_python_split_conflicts::mode::{MeanMode, RunConfig, SplitNullMode};
use rust_python_split_conflicts::pipeline::{MeanReport, run_files, write_outputs};
use rust_python_split_conflicts::resample::{DEFAULT_MEAN_TRIALS, DEFAULT_SPLIT_TRIALS};
use std::path::PathBuf;
use std::time::Instant;

/// Count bipartitions of target trees that conflict with a reference tree, and
/// build resampling null distributions of those counts.
#[derive(Parser, Debug)]
#[command(name = "split-conflicts", version, about = "Split conflicts between a reference tree and target trees")]
struct Args {
    /// Reference tree (newick)
    reference: PathBuf,

    /// Target trees (newick, one or more `;`-terminated trees)
    targets: PathBuf,

    /// Taxon on which every tree is rooted
    root_taxon: String,

    /// mean: report mean conflicts | null: resample the mean statistics
    #[arg(value_parser = parse_mean_mode)]
    mean_mode: MeanMode,

    /// splitNull: resample per reference split | none
    #[arg(value_parser = parse_split_mode)]
    split_mode: SplitNullMode,

    /// Trials for the mean null distributions
    #[arg(long = "mean-trials", default_value_t = DEFAULT_MEAN_TRIALS)]
    mean_trials: usize,

    /// Trials for the per-split null distribution
    #[arg(long = "split-trials", default_value_t = DEFAULT_SPLIT_TRIALS)]
    split_trials: usize,

    /// Seed for resampling (random when omitted; the seed used is logged)
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Directory receiving conflictMeans.txt, incompatibleMeans.txt and nullSplits.csv
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn parse_mean_mode(s: &str) -> Result<MeanMode, String> {
    s.parse().map_err(|e: ConflictError| e.to_string())
}

fn parse_split_mode(s: &str) -> Result<SplitNullMode, String> {
    s.parse().map_err(|e: ConflictError| e.to_string())
}

fn main() {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = RunConfig::new(args.mean_mode, args.split_mode)
        .with_trials(args.mean_trials, args.split_trials)
        .with_output_dir(&args.output_dir);
    config.seed = args.seed;

    let t0 = Instant::now();
    let outcome = match run_files(&args.reference, &args.targets, &args.root_taxon, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{e}");
            std::process::exit(exit_code(&e));
        }
    };
    info!("Analysis ({} / {}) {:.3}s", config.mean_mode, config.split_mode, t0.elapsed().as_secs_f64());

    if let Some(report) = &outcome.mean_report {
        print_mean_report(report);
    }

    let t1 = Instant::now();
    match write_outputs(&outcome, &config) {
        Ok(written) => {
            for path in written {
                info!("Wrote {}", path.display());
            }
        }
        Err(e) => {
            error!("Failed to write output: {e}");
            std::process::exit(exit_code(&e));
        }
    }
    info!("Writing to output {:.3}s", t1.elapsed().as_secs_f64());
}

fn print_mean_report(report: &MeanReport) {
    println!("The mean number of conflicts: {}", report.mean_conflicts);
    println!(
        "The list of the number of conflicting bipartitions in each target tree: {:?}",
        report.conflict_counts
    );
    for (split, count) in &report.conflicted_splits {
        println!("Reference tree bipartition: {split}");
        println!("Number of target trees conflicting with this bipartition: {count}");
    }
}

fn exit_code(e: &ConflictError) -> i32 {
    match e {
        ConflictError::Config(_) => 2,
        ConflictError::Io(_) | ConflictError::Newick { .. } | ConflictError::EmptyTreeList(_) => 3,
        ConflictError::UniverseMismatch { .. } => 4,
        ConflictError::SampleSize { .. } => 5,
        _ => 6,
    }
}
