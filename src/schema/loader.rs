//! Validator command files on disk
//!
//! Commands live at `<data_dir>/validators/<collection>.json`, one `collMod`
//! command per file. Malformed files fail the load.

use std::fs;
use std::path::{Path, PathBuf};

use super::definitions::ValidatorCommand;
use super::errors::{SchemaError, SchemaResult};

/// Reads and writes validator command files.
pub struct ValidatorLoader {
    validator_dir: PathBuf,
}

impl ValidatorLoader {
    /// Creates a loader for the given data directory.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            validator_dir: data_dir.join("validators"),
        }
    }

    pub fn validator_dir(&self) -> &Path {
        &self.validator_dir
    }

    /// Loads every `*.json` command, sorted by file name.
    ///
    /// A missing directory yields no commands.
    pub fn load_all(&self) -> SchemaResult<Vec<ValidatorCommand>> {
        if !self.validator_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.validator_dir).map_err(|e| {
            SchemaError::malformed_descriptor(
                self.validator_dir.display().to_string(),
                format!("Failed to read validator directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_descriptor(
                    self.validator_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| Self::load_file(p)).collect()
    }

    fn load_file(path: &Path) -> SchemaResult<ValidatorCommand> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_descriptor(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let raw: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_descriptor(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        ValidatorCommand::from_command(&raw)
    }

    /// Writes a command to `<collection>.json`, replacing any existing file.
    pub fn save(&self, command: &ValidatorCommand) -> SchemaResult<PathBuf> {
        fs::create_dir_all(&self.validator_dir).map_err(|e| {
            SchemaError::malformed_descriptor(
                self.validator_dir.display().to_string(),
                format!("Failed to create validator directory: {}", e),
            )
        })?;

        let path = self.validator_dir.join(format!("{}.json", command.collection));
        let content = serde_json::to_string_pretty(&command.to_command()).map_err(|e| {
            SchemaError::malformed_descriptor(path.display().to_string(), format!("Failed to serialize: {}", e))
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_descriptor(path.display().to_string(), format!("Failed to write file: {}", e))
        })?;

        Ok(path)
    }
}
