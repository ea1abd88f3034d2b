use colored::Colorize;
use std::process::ExitCode;

fn main() -> ExitCode {
    match dfql::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("{}", format!("{err:#}").red());
            ExitCode::FAILURE
        }
    }
}
