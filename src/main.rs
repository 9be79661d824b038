//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::info;

use datamorph::{build_report, Cleaner, Error, ReportContext, Result, Table};

/// Convert tabular data between CSV, Excel and JSON, with optional cleaning.
#[derive(Parser)]
#[command(name = "datamorph", version, about)]
struct Args {
    /// Input file (.csv, .xlsx, .xls, .json, .jsonl)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file; the format is chosen by extension
    #[arg(short, long)]
    output: PathBuf,

    /// Run the cleaning pipeline before writing
    #[arg(long)]
    clean: bool,

    /// Write a Markdown report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(short, long)]
    force: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(Error::OutputExists {
            path: args.output.clone(),
        });
    }
    if let Some(report) = &args.report {
        if report.exists() && !args.force {
            return Err(Error::OutputExists {
                path: report.clone(),
            });
        }
    }

    let start = Instant::now();
    let table = Table::read(&args.input)?;
    let input_rows = table.len();
    info!("read {} rows from {}", input_rows, args.input.display());

    let (table, summary) = if args.clean {
        let (cleaned, summary) = Cleaner::new().clean(&table)?;
        (cleaned, Some(summary))
    } else {
        (table, None)
    };

    table.write(&args.output)?;
    let output_rows = table.len();
    let duration = start.elapsed();
    info!(
        "wrote {} rows to {} in {:.2}s",
        output_rows,
        args.output.display(),
        duration.as_secs_f64()
    );

    if let Some(report_path) = &args.report {
        let report = build_report(&ReportContext {
            input: &args.input,
            output: &args.output,
            input_rows,
            output_rows,
            duration,
            summary: summary.as_ref(),
        });
        std::fs::write(report_path, report).map_err(|e| Error::io(e, report_path))?;
        println!("Report written to {}", report_path.display());
    }

    match &summary {
        Some(summary) => println!(
            "Cleaned and converted {} -> {}: {} row(s), {} duplicate(s) removed, {} value(s) imputed",
            args.input.display(),
            args.output.display(),
            output_rows,
            summary.duplicates_removed,
            summary.imputed_total(),
        ),
        None => println!(
            "Converted {} -> {}: {} row(s)",
            args.input.display(),
            args.output.display(),
            output_rows,
        ),
    }

    Ok(())
}
