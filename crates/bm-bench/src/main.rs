use std::io;
use std::process::ExitCode;

use bm_bench::{run, BenchConfig, Command, USAGE};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let config = match BenchConfig::parse(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    match run(&config, &mut stdout.lock()) {
        Ok(report) => {
            if !report.is_exact() {
                // All strategies accumulate in the same order; results must match exactly.
                error!(max_abs_diff = report.max_abs_diff(), "results disagree");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Cannot run the multiplication: {}", e);
            ExitCode::FAILURE
        }
    }
}
