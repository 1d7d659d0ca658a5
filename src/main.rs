//! Command line entry point of the batch runner.
//!
//! Usage:
//!   eclipse-batch from_file data/*.txt --save-dir results
//!   eclipse-batch ephem_from_file -l targets.txt -w 8 --delimiter ,
//!   eclipse-batch from_identifier --data-dir tess/ --discover
//!   eclipse-batch from_tic 0000000012345678 --data-dir tess/
//!
//! Log verbosity follows `RUST_LOG` (default `info`).
use std::fs;
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use eclipse_batch::adapters::{AdapterConfig, AdapterKind};
use eclipse_batch::batch::{BatchRunner, WorkerCount};
use eclipse_batch::batch_errors::BatchError;
use eclipse_batch::constants::{DEFAULT_MAX_N, MIN_SAMPLES};
use eclipse_batch::target::{identifiers_in_file_names, CatalogId, Target};

const FITS_EXTENSIONS: [&str; 2] = ["fits", "fit"];

#[derive(Parser)]
#[command(name = "eclipse-batch")]
#[command(about = "Run eclipse detection over a set of light curves in parallel")]
struct Args {
    /// Adapter name (ephem_from_file, from_file, from_identifier, from_tic)
    adapter: String,

    /// Targets: file paths, or catalog identifiers for the identifier adapter
    targets: Vec<String>,

    /// File listing one target per line
    #[arg(short = 'l', long)]
    target_list: Option<Utf8PathBuf>,

    /// Number of workers (default: host cores minus two, at least 1)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Field delimiter of text light curves (default: whitespace)
    #[arg(short = 'd', long, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Directory receiving one JSON result per target
    #[arg(short = 's', long)]
    save_dir: Option<Utf8PathBuf>,

    /// Directory scanned recursively for mission FITS files
    #[arg(long)]
    data_dir: Option<Utf8PathBuf>,

    /// Analyse every identifier found in the data directory file names
    #[arg(long)]
    discover: bool,

    /// Maximum number of eclipses listed per target
    #[arg(long, default_value_t = DEFAULT_MAX_N)]
    max_n: usize,

    /// Minimum number of samples required by the identifier adapter
    #[arg(long, default_value_t = MIN_SAMPLES)]
    min_samples: usize,

    /// Print one line per target after the summary
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("expected a single ASCII character, got {s:?}")),
    }
}

/// Mission files under `dir`, sorted by path.
fn scan_fits_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, BatchError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in current.read_dir_utf8()? {
            let path = entry?.into_path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| FITS_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn collect_targets(
    args: &Args,
    adapter: AdapterKind,
    pool: &[Utf8PathBuf],
) -> Result<Vec<Target>, BatchError> {
    let mut raw = args.targets.clone();
    if let Some(list) = &args.target_list {
        raw.extend(
            fs::read_to_string(list)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }

    if !adapter.takes_identifiers() {
        return Ok(raw.iter().map(|t| Target::from(t.as_str())).collect());
    }

    let mut targets = raw
        .iter()
        .map(|t| t.parse::<CatalogId>().map(Target::from))
        .collect::<Result<Vec<_>, _>>()?;
    if args.discover {
        targets.extend(identifiers_in_file_names(pool).into_iter().map(Target::from));
    }
    Ok(targets)
}

fn run(args: Args) -> Result<(), BatchError> {
    let adapter: AdapterKind = args.adapter.parse()?;
    let workers = WorkerCount::from_option(args.workers)?;

    let pool = match &args.data_dir {
        Some(dir) => scan_fits_files(dir)?,
        None => Vec::new(),
    };
    let targets = collect_targets(&args, adapter, &pool)?;

    let mut builder = AdapterConfig::builder()
        .available_files(pool)
        .max_n(args.max_n)
        .min_samples(args.min_samples);
    if let Some(delimiter) = args.delimiter {
        builder = builder.delimiter(delimiter);
    }
    if let Some(dir) = &args.save_dir {
        builder = builder.save_dir(dir.clone());
    }

    let outcome = BatchRunner::new(adapter)
        .workers(workers)
        .config(builder.build())
        .run(&targets)?;

    println!("{}", outcome.timing);
    println!(
        "{} succeeded, {} failed",
        outcome.n_succeeded(),
        outcome.n_failed()
    );

    if args.verbose {
        for (target, result) in outcome.paired(&targets) {
            match (&result.result, &result.failure) {
                (_, Some(failure)) => println!("{target}: {failure}"),
                (Some(r), None) => println!(
                    "{target}: {} eclipses, period {:.5}, quality {}",
                    r.n_eclipses, r.period, r.quality_code
                ),
                (None, None) => println!("{target}: no result"),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
