//! JSON I/O handling for CLI
//!
//! - Input: JSON documents, one per line, via stdin
//! - Fixtures: a JSON array or JSON lines
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read JSON documents from stdin, one per line. Blank lines are skipped.
pub fn read_documents() -> CliResult<Vec<Value>> {
    let stdin = io::stdin();
    parse_lines(stdin.lock(), "stdin")
}

/// Read a fixture file holding a JSON array or JSON lines
pub fn read_fixture(path: &Path) -> CliResult<Vec<Value>> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .map_err(|e| CliError::invalid_input(format!("{}: {}", path.display(), e)));
    }

    parse_lines(content.as_bytes(), &path.display().to_string())
}

fn parse_lines<R: BufRead>(reader: R, source: &str) -> CliResult<Vec<Value>> {
    let mut documents = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc = serde_json::from_str(&line)
            .map_err(|e| CliError::invalid_input(format!("{} line {}: {}", source, index + 1, e)))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
