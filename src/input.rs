//! Input resolution: stdin, `--input` and flags merged into one request
//!
//! Precedence (lowest to highest): stdin, `--input`, individual flags.
//! The keys of the merged object are the provided properties.

use declarative::{Error, ProvidedProperties, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::{IsTerminal, Read};
use std::path::Path;

/// How strictly stdin and empty input are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Bad stdin is an error when it is the only input; empty input is an error
    Settings,
    /// Bad or empty stdin is ignored
    User,
}

/// Raw input sources, before parsing
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub stdin: Option<String>,
    pub input: Option<String>,
    pub flags: Map<String, Value>,
}

impl Sources {
    /// Collect sources, reading stdin only when it is piped and `--input`
    /// was not given
    pub fn gather(input: Option<String>, flags: Map<String, Value>) -> Result<Self> {
        let stdin = if input.is_none() { read_piped_stdin()? } else { None };
        Ok(Self {
            stdin,
            input,
            flags,
        })
    }
}

/// The merged request
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub values: Map<String, Value>,
    pub provided: ProvidedProperties,
}

fn read_piped_stdin() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .map_err(|e| Error::Input(format!("failed to read standard input: {e}")))?;
    log::debug!(target: "input", bytes = text.len(); "Read standard input");
    Ok(Some(text))
}

fn parse_object(text: &str, origin: &str) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!("{origin} must be a JSON object")),
        Err(e) => Err(format!("invalid JSON in {origin}: {e}")),
    }
}

/// Parse `--input`: inline JSON when it starts with `{`, otherwise a file path
pub fn load_input(value: &str) -> Result<Map<String, Value>> {
    let trimmed = value.trim();
    if trimmed.starts_with('{') {
        return parse_object(trimmed, "--input").map_err(Error::Input);
    }

    let path = Path::new(trimmed);
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Input(format!("failed to read input file {}: {e}", path.display())))?;
    log::debug!(target: "input", "Loaded input from {}", path.display());
    parse_object(&text, &path.display().to_string()).map_err(Error::Input)
}

/// Merge the sources under `policy`
pub fn resolve(policy: Policy, sources: Sources) -> Result<Resolved> {
    let mut values = Map::new();

    if let Some(text) = sources.stdin.as_deref().filter(|t| !t.trim().is_empty()) {
        match parse_object(text, "standard input") {
            Ok(map) => values.extend(map),
            Err(message) => match policy {
                Policy::User => {
                    log::debug!(target: "input", "Ignoring standard input: {message}");
                }
                Policy::Settings if sources.flags.is_empty() && sources.input.is_none() => {
                    return Err(Error::Input(message));
                }
                Policy::Settings => {
                    log::warn!(target: "input", "Ignoring standard input: {message}");
                }
            },
        }
    }

    if let Some(input) = &sources.input {
        values.extend(load_input(input)?);
    }

    values.extend(sources.flags);

    if values.is_empty() && policy == Policy::Settings {
        return Err(Error::Input(
            "no input provided; use --input, flags, or pipe JSON to standard input".into(),
        ));
    }

    let provided = ProvidedProperties::from_map(&values);
    log::debug!(target: "input", properties = provided.len(); "Resolved input");

    Ok(Resolved { values, provided })
}
