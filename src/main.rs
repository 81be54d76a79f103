//! Binary entrypoint for the `fleetfix` CLI.

use std::process::ExitCode;

use env_logger::Env;

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    match fleetfix::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
