use clap::Parser;
use foldify::cli::{Cli, init_logging, run_cli};
use foldify::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match run_cli(&cli) {
        Ok(report) if report.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::from(2)
        }
    }
}
