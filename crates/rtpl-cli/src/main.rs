mod args;
mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
