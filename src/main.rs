//! inspectdb CLI entry point
//!
//! Parses arguments and dispatches to the CLI module, which writes the
//! JSON envelope. Exits non-zero on failure.

use inspectdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
