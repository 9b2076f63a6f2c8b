//! CLI argument definitions using clap
//!
//! Commands:
//! - inspectdb init --config <path>
//! - inspectdb schema --collection <name>
//! - inspectdb validate --config <path> --collection <name>
//! - inspectdb load --config <path>
//! - inspectdb query --config <path> <entry> [params]
//! - inspectdb explain <entry> [params]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::QueryParams;

/// inspectdb - restaurant inspection validators and reports
#[derive(Parser, Debug)]
#[command(name = "inspectdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory with empty fixtures and default validators
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./inspectdb.json")]
        config: PathBuf,
    },

    /// Print the validator command for a collection
    Schema {
        /// restaurants or inspections
        #[arg(long)]
        collection: String,
    },

    /// Validate JSON documents read from stdin, one per line
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./inspectdb.json")]
        config: PathBuf,

        /// Collection whose validator applies
        #[arg(long)]
        collection: String,
    },

    /// Check the fixture files against the validators (test harness).
    ///
    /// Documents go into a throwaway in-memory store; nothing is written back.
    Load {
        /// Path to configuration file
        #[arg(long, default_value = "./inspectdb.json")]
        config: PathBuf,
    },

    /// Load fixtures and run a catalog entry
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./inspectdb.json")]
        config: PathBuf,

        /// Catalog entry, e.g. worst-by-cuisine
        entry: String,

        #[command(flatten)]
        params: QueryArgs,
    },

    /// Print the database command for a catalog entry
    Explain {
        /// Catalog entry, e.g. violations-by-date
        entry: String,

        #[command(flatten)]
        params: QueryArgs,
    },
}

/// Parameters of the parameterized catalog entries
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Cuisine for restaurants-by-cuisine
    #[arg(long)]
    pub cuisine: Option<String>,

    /// Exclusive rating threshold for rated-above
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Row limit for worst
    #[arg(long)]
    pub limit: Option<i64>,

    /// Restaurants per cuisine for worst-by-cuisine
    #[arg(long)]
    pub per_cuisine: Option<i64>,

    /// Cuisine cap for worst-by-cuisine
    #[arg(long)]
    pub max_cuisines: Option<i64>,
}

impl QueryArgs {
    /// Applies the given values over the defaults
    pub fn to_params(&self) -> QueryParams {
        let defaults = QueryParams::default();
        QueryParams {
            cuisine: self.cuisine.clone().unwrap_or(defaults.cuisine),
            min_rating: self.min_rating.unwrap_or(defaults.min_rating),
            limit: self.limit.unwrap_or(defaults.limit),
            per_cuisine: self.per_cuisine.unwrap_or(defaults.per_cuisine),
            max_cuisines: self.max_cuisines.unwrap_or(defaults.max_cuisines),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
