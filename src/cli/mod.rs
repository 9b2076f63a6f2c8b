//! CLI module for inspectdb
//!
//! Provides command-line interface for:
//! - init: Create the data directory with fixtures and validators
//! - schema: Print a validator command
//! - validate: Validate documents from stdin
//! - load: Load fixtures through the validators
//! - query: Run a catalog entry over the fixtures
//! - explain: Print a catalog entry's database command

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{
    explain, init, load, query, run, run_command, schema, validate, CollectionLoad, Config, LoadReport,
    Rejection,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_documents, read_fixture, write_error, write_response};
