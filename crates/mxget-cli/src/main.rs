use mxget_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // The log file lives in the XDG state dir; stderr is the fallback.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("mxget error: {:#}", err);
        std::process::exit(1);
    }
}
