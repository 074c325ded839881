//! tstoy settings resource - a JSON file per scope
//!
//! The file holds `{"updates": {"updateAutomatically": bool, "updateFrequency": int}}`.
//! Keys this resource does not manage are preserved on update.

use declarative::{
    Action, ApplyResult, CurrentState, Error, MatchReport, Observation, ProvidedProperties,
    Resource, Result, compare,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default written for `updateAutomatically` when neither request nor file set it
pub const DEFAULT_UPDATE_AUTOMATICALLY: bool = false;

/// Default written for `updateFrequency` when neither request nor file set it
pub const DEFAULT_UPDATE_FREQUENCY: i64 = 180;

const UPDATES: &str = "updates";
const UPDATE_AUTOMATICALLY: &str = "updateAutomatically";
const UPDATE_FREQUENCY: &str = "updateFrequency";

/// Which settings file a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Machine,
    User,
}

impl Scope {
    /// Order used by `export`
    pub const ALL: [Scope; 2] = [Scope::User, Scope::Machine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired settings, parsed from schema-validated input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsRequest {
    pub scope: Scope,
    #[serde(rename = "_exist", default)]
    pub exist: Option<bool>,
    #[serde(rename = "updateAutomatically", default)]
    pub update_automatically: Option<bool>,
    #[serde(rename = "updateFrequency", default)]
    pub update_frequency: Option<i64>,
}

impl SettingsRequest {
    /// A request naming only the scope
    pub fn for_scope(scope: Scope) -> Self {
        Self {
            scope,
            exist: None,
            update_automatically: None,
            update_frequency: None,
        }
    }

    pub fn from_input(input: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(input.clone()))
            .map_err(|e| Error::Validation(e.to_string()))
    }
}

/// Observed state of one scope's settings file
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsState {
    pub scope: Scope,
    pub exists: bool,
    /// Something is on disk, even if it could not be parsed
    pub file_present: bool,
    pub update_automatically: Option<bool>,
    pub update_frequency: Option<i64>,
    document: Option<Map<String, Value>>,
}

impl SettingsState {
    fn absent(scope: Scope, file_present: bool) -> Self {
        Self {
            scope,
            exists: false,
            file_present,
            update_automatically: None,
            update_frequency: None,
            document: None,
        }
    }

    fn from_document(scope: Scope, document: Map<String, Value>) -> Self {
        let updates = document.get(UPDATES).and_then(Value::as_object);

        if updates.is_none() {
            log::info!(target: "settings", "No 'updates' section found in config file");
        }

        let update_automatically = updates
            .and_then(|u| u.get(UPDATE_AUTOMATICALLY))
            .and_then(Value::as_bool);
        let update_frequency = updates
            .and_then(|u| u.get(UPDATE_FREQUENCY))
            .and_then(Value::as_i64);

        Self {
            scope,
            exists: true,
            file_present: true,
            update_automatically,
            update_frequency,
            document: Some(document),
        }
    }
}

impl CurrentState for SettingsState {
    fn exists(&self) -> bool {
        self.exists
    }

    fn occupied(&self) -> bool {
        self.file_present
    }
}

/// The record printed for a settings observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    #[serde(rename = "_exist")]
    pub exist: bool,
    pub scope: Scope,
    #[serde(
        rename = "updateAutomatically",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_automatically: Option<bool>,
    #[serde(
        rename = "updateFrequency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_frequency: Option<i64>,
}

impl SettingsRecord {
    /// Absent resources report only the scope; everything else reports the
    /// current values, whether or not they matched.
    pub fn from_observation(scope: Scope, observation: &Observation<SettingsState>) -> Self {
        let current = observation.current();
        Self {
            exist: observation.in_desired_state(),
            scope,
            update_automatically: current.and_then(|c| c.update_automatically),
            update_frequency: current.and_then(|c| c.update_frequency),
        }
    }
}

/// The settings file for one scope
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. Malformed content degrades to "no configuration".
    pub fn load(&self, scope: Scope) -> Result<SettingsState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(target: "settings", "Config file not found: {}", self.path.display());
                return Ok(SettingsState::absent(scope, false));
            }
            Err(e) => {
                return Err(Error::probe(
                    format!("{scope} settings"),
                    format!("{}: {e}", self.path.display()),
                ));
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(document)) => {
                log::info!(target: "settings", "Config loaded: {}", self.path.display());
                Ok(SettingsState::from_document(scope, document))
            }
            Ok(other) => {
                log::warn!(
                    target: "settings",
                    "Config file {} is not a JSON object ({}), treating as no configuration",
                    self.path.display(),
                    other
                );
                Ok(SettingsState::absent(scope, true))
            }
            Err(e) => {
                log::warn!(
                    target: "settings",
                    "Config file {} is not valid JSON ({e}), treating as no configuration",
                    self.path.display()
                );
                Ok(SettingsState::absent(scope, true))
            }
        }
    }

    fn write(&self, document: &Map<String, Value>) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut content = serde_json::to_string_pretty(document)?;
        content.push('\n');
        fs::write(&self.path, content)
    }

    fn remove(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Settings resource: one request against one scope's file
#[derive(Debug)]
pub struct Settings {
    request: SettingsRequest,
    provided: ProvidedProperties,
    file: SettingsFile,
}

impl Settings {
    pub fn new(request: SettingsRequest, provided: ProvidedProperties, file: SettingsFile) -> Self {
        Self {
            request,
            provided,
            file,
        }
    }

    pub fn scope(&self) -> Scope {
        self.request.scope
    }

    pub fn request(&self) -> &SettingsRequest {
        &self.request
    }

    /// The document to write: current file, overridden by the request,
    /// defaults for whatever is still unset
    fn merged_document(&self, current: &SettingsState) -> Map<String, Value> {
        let mut document = current.document.clone().unwrap_or_default();

        let mut updates = document
            .get(UPDATES)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let update_automatically = self
            .request
            .update_automatically
            .or(current.update_automatically)
            .unwrap_or(DEFAULT_UPDATE_AUTOMATICALLY);
        let update_frequency = self
            .request
            .update_frequency
            .or(current.update_frequency)
            .unwrap_or(DEFAULT_UPDATE_FREQUENCY);

        updates.insert(UPDATE_AUTOMATICALLY.into(), Value::Bool(update_automatically));
        updates.insert(UPDATE_FREQUENCY.into(), Value::from(update_frequency));
        document.insert(UPDATES.into(), Value::Object(updates));
        document
    }

    fn write_failed(&self, action: Action, e: impl fmt::Display) -> Error {
        Error::mutation(
            self.id(),
            action.verb(),
            format!("{}: {e}", self.file.path().display()),
        )
    }
}

impl Resource for Settings {
    type State = SettingsState;

    fn id(&self) -> String {
        format!("{} scope settings", self.request.scope)
    }

    fn resource_type(&self) -> &'static str {
        "settings"
    }

    fn identity_key(&self) -> &'static str {
        "scope"
    }

    fn provided(&self) -> &ProvidedProperties {
        &self.provided
    }

    fn desired_exist(&self) -> bool {
        self.request.exist.unwrap_or(true)
    }

    fn probe(&self) -> Result<SettingsState> {
        self.file.load(self.request.scope)
    }

    fn compare(&self, current: &SettingsState) -> MatchReport {
        let mut report = MatchReport::new();

        for name in self.provided.requested(self.identity_key(), self.unobservable()) {
            match name {
                UPDATE_AUTOMATICALLY => {
                    if let Some(requested) = &self.request.update_automatically {
                        report.push(compare(
                            name,
                            requested,
                            current.update_automatically.as_ref(),
                        ));
                    }
                }
                UPDATE_FREQUENCY => {
                    if let Some(requested) = &self.request.update_frequency {
                        report.push(compare(name, requested, current.update_frequency.as_ref()));
                    }
                }
                other => log::debug!(target: "settings", "Ignoring unknown property {other}"),
            }
        }

        report
    }

    fn apply(&self, action: Action, current: &SettingsState) -> Result<ApplyResult> {
        match action {
            Action::None => Ok(ApplyResult::NoChange),
            Action::Remove => {
                self.file
                    .remove()
                    .map_err(|e| self.write_failed(action, e))?;
                log::info!(target: "settings", "Removed {}", self.file.path().display());
                Ok(ApplyResult::Removed)
            }
            Action::Create | Action::Update => {
                let document = self.merged_document(current);

                if current.document.as_ref() == Some(&document) {
                    log::info!(target: "settings", "Settings already in desired state, leaving file untouched");
                    return Ok(ApplyResult::NoChange);
                }

                self.file
                    .write(&document)
                    .map_err(|e| self.write_failed(action, e))?;
                log::info!(target: "settings", "Config updated: {}", self.file.path().display());

                Ok(if current.exists {
                    ApplyResult::Modified
                } else {
                    ApplyResult::Created
                })
            }
        }
    }
}
