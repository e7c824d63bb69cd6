use anyhow::Result;
use clap::Parser;
use dq_harvest::{init_tracing_once, Harvester, RunOutcome, COLUMNS_FILE, DEDUPLICATED_FILE, OUTPUT_FILE};
use std::path::PathBuf;
use std::process::ExitCode;

/// Captures the contents of the /r/malefashionadvice Daily Questions threads.
#[derive(Parser, Debug)]
#[command(name = "dq-harvest", version, about)]
struct Args {
    /// File where comment data is stored while fetching is in progress
    #[arg(short = 'o', long, default_value = OUTPUT_FILE)]
    output_file: PathBuf,

    /// File where final, deduplicated comment data is stored
    #[arg(short = 'd', long, default_value = DEDUPLICATED_FILE)]
    deduplicated_file: PathBuf,

    /// File where the column definitions are stored
    #[arg(short = 'c', long, default_value = COLUMNS_FILE)]
    columns_file: PathBuf,
}

fn main() -> ExitCode {
    init_tracing_once();
    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let harvester = Harvester::new()
        .output_file(&args.output_file)
        .deduplicated_file(&args.deduplicated_file)
        .columns_file(&args.columns_file)
        .merge_env();

    let outcome = harvester.run()?;
    match &outcome {
        RunOutcome::Succeeded { value, attempts, .. } => tracing::info!(
            "Process complete: {} unique comments ({} appended this pass, {} attempt(s))",
            value.unique,
            value.appended,
            attempts
        ),
        RunOutcome::Exhausted { attempts, .. } => tracing::error!("Giving up after {} attempts", attempts),
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
