use std::process::ExitCode;

use clap::Parser;
use tablekit::cli::{Args, run};

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = tablekit_log::init_logging(&args.log_level) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
