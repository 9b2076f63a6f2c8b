//! CLI command implementations
//!
//! Every command loads its configuration first, does its work against an
//! in-memory store filled from the fixture files, and writes exactly one
//! JSON envelope to stdout.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{Catalog, CatalogEntry, QueryParams};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{
    SchemaError, SchemaValidator, ValidationAction, ValidationLevel, ValidatorCommand, ValidatorLoader, INSPECTIONS,
    RESTAURANTS,
};
use crate::store::DocumentStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_documents, read_fixture, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory holding fixtures and validators (required)
    pub data_dir: String,

    /// Overrides the validation level of every loaded validator
    #[serde(default)]
    pub validation_level: Option<ValidationLevel>,

    /// Overrides the validation action of every loaded validator
    #[serde(default)]
    pub validation_action: Option<ValidationAction>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Logger::set_min_severity(config.severity()?);
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str()), ("data_dir", config.data_dir.as_str())],
        );

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        self.severity()?;
        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| CliError::config_error(format!("Invalid log_level: '{}'", self.log_level)))
    }
}

/// Per-collection outcome of a fixture load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionLoad {
    pub collection: String,
    pub accepted: usize,
    pub rejected: usize,
}

/// A fixture document refused by the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub collection: String,
    /// Zero-based position in the fixture file
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Outcome of loading every fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub collections: Vec<CollectionLoad>,
    pub rejections: Vec<Rejection>,
}

/// Run the CLI, writing failures as an error envelope
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command) {
        Ok(()) => Ok(()),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Schema { collection } => schema(&collection),
        Command::Validate { config, collection } => validate(&config, &collection),
        Command::Load { config } => load(&config),
        Command::Query { config, entry, params } => query(&config, &entry, &params.to_params()),
        Command::Explain { entry, params } => explain(&entry, &params.to_params()),
    }
}

/// Create the data directory with empty fixtures and default validators
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    fs::create_dir_all(data_dir)
        .map_err(|e| CliError::config_error(format!("Failed to create directory {:?}: {}", data_dir, e)))?;

    for collection in [RESTAURANTS, INSPECTIONS] {
        fs::write(fixture_path(data_dir, collection), "[]")?;
    }

    let loader = ValidatorLoader::new(data_dir);
    for command in ValidatorCommand::defaults() {
        loader.save(&command)?;
    }

    write_response(json!({"initialized": true}))
}

/// Print the validator command for a collection
pub fn schema(collection: &str) -> CliResult<()> {
    let command = default_command(collection)?;
    write_response(command.to_command())
}

/// Validate stdin documents against a collection's validator
pub fn validate(config_path: &Path, collection: &str) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let documents = read_documents()?;
    let data = validation_report(&config, collection, &documents)?;
    write_response(data)
}

/// Dry-run the fixture files through the validators and report accepted
/// and rejected documents. The store is discarded afterwards.
pub fn load(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let (_, report) = open_store(&config)?;
    write_response(serde_json::to_value(report)?)
}

/// Load fixtures and run a catalog entry
pub fn query(config_path: &Path, entry: &str, params: &QueryParams) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data = query_results(&config, entry, params)?;
    write_response(data)
}

/// Print the database command for a catalog entry
pub fn explain(entry: &str, params: &QueryParams) -> CliResult<()> {
    write_response(explain_entry(entry, params)?)
}

fn default_command(collection: &str) -> CliResult<ValidatorCommand> {
    ValidatorCommand::defaults()
        .into_iter()
        .find(|c| c.collection == collection)
        .ok_or_else(|| SchemaError::collection_not_found(collection).into())
}

fn fixture_path(data_dir: &Path, collection: &str) -> std::path::PathBuf {
    data_dir.join(format!("{}.json", collection))
}

/// Check if data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    [RESTAURANTS, INSPECTIONS]
        .iter()
        .all(|collection| fixture_path(data_dir, collection).exists())
}

/// Validator commands from the data directory, or the built-in ones when
/// none are stored, with the configured overrides applied.
fn load_validators(config: &Config) -> CliResult<Vec<ValidatorCommand>> {
    let mut commands = ValidatorLoader::new(config.data_path()).load_all()?;
    if commands.is_empty() {
        commands = ValidatorCommand::defaults();
    }

    for command in &mut commands {
        if let Some(level) = config.validation_level {
            command.validator.level = level;
        }
        if let Some(action) = config.validation_action {
            command.validator.action = action;
        }
    }
    Ok(commands)
}

fn validation_report(config: &Config, collection: &str, documents: &[Value]) -> CliResult<Value> {
    let command = load_validators(config)?
        .into_iter()
        .find(|c| c.collection == collection)
        .ok_or_else(|| SchemaError::collection_not_found(collection))?;
    let validator = SchemaValidator::compile(&command.validator.schema)?;

    let results: Vec<Value> = documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let result = validator.validate(document);
            json!({
                "line": index + 1,
                "valid": result.is_valid(),
                "violations": result.violations,
            })
        })
        .collect();

    Ok(json!({
        "collection": collection,
        "validationLevel": command.validator.level.as_str(),
        "validationAction": command.validator.action.as_str(),
        "results": results,
    }))
}

/// Fills a store from the fixture files through the installed validators
fn open_store(config: &Config) -> CliResult<(DocumentStore, LoadReport)> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::not_initialized());
    }

    let mut store = DocumentStore::with_collections([RESTAURANTS, INSPECTIONS]);
    for command in load_validators(config)? {
        store.apply_command(&command)?;
    }

    let mut report = LoadReport::default();
    for collection in [RESTAURANTS, INSPECTIONS] {
        let documents = read_fixture(&fixture_path(data_dir, collection))?;
        let mut accepted = 0;
        let mut rejected = 0;
        for (index, document) in documents.into_iter().enumerate() {
            match store.insert(collection, document) {
                Ok(_) => accepted += 1,
                Err(e) => {
                    rejected += 1;
                    report.rejections.push(Rejection {
                        collection: collection.to_string(),
                        index,
                        code: e.code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        log_event_with_fields(
            Event::FixturesLoaded,
            &[
                ("collection", collection),
                ("accepted", accepted.to_string().as_str()),
                ("rejected", rejected.to_string().as_str()),
            ],
        );
        report.collections.push(CollectionLoad {
            collection: collection.to_string(),
            accepted,
            rejected,
        });
    }

    Ok((store, report))
}

fn query_results(config: &Config, entry: &str, params: &QueryParams) -> CliResult<Value> {
    let entry: CatalogEntry = entry.parse()?;
    let (store, _) = open_store(config)?;
    let documents = Catalog::new(&store).run(entry, params)?;
    Ok(json!({
        "entry": entry.name(),
        "count": documents.len(),
        "documents": documents,
    }))
}

fn explain_entry(entry: &str, params: &QueryParams) -> CliResult<Value> {
    let entry: CatalogEntry = entry.parse()?;
    let query = entry.query(params);
    Ok(json!({
        "entry": entry.name(),
        "command": query.to_command(),
        "shell": query.to_shell(),
    }))
}
