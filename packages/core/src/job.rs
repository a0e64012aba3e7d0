//! Job request records handed from the submission layer to the launcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::CoreError;

/// Key holding the project a job belongs to.
pub const PROJECT_KEY: &str = "_project";
/// Key holding the spider to run.
pub const SPIDER_KEY: &str = "_spider";
/// Key holding the job identifier. Forwarded to the spider as a regular argument.
pub const JOB_KEY: &str = "_job";
/// Key holding the nested run-time settings mapping.
pub const SETTINGS_KEY: &str = "settings";

/// Keys interpreted by the launcher rather than forwarded as plain arguments.
pub const RESERVED_KEYS: [&str; 4] = [PROJECT_KEY, SPIDER_KEY, JOB_KEY, SETTINGS_KEY];

/// Unique identifier for a job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to run one spider of one project.
///
/// The record is a flat string-keyed mapping. `_project` and `_spider` identify
/// the job, `settings` holds run-time settings, and every other key is passed to
/// the spider as an argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRequest(Map<String, Value>);

impl JobRequest {
    /// Create a request for `spider` in `project`.
    pub fn new(project: impl Into<String>, spider: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(PROJECT_KEY.to_string(), Value::String(project.into()));
        map.insert(SPIDER_KEY.to_string(), Value::String(spider.into()));
        Self(map)
    }

    /// Wrap an existing mapping without validating it.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Attach a job identifier under `_job`.
    pub fn with_job_id(mut self, id: JobId) -> Self {
        self.0
            .insert(JOB_KEY.to_string(), Value::String(id.to_string()));
        self
    }

    /// Add a spider argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Add a spider argument supplied by a user, rejecting [`RESERVED_KEYS`].
    pub fn try_with_arg(
        self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, CoreError> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(CoreError::ReservedKey(key));
        }
        Ok(self.with_arg(key, value))
    }

    /// Add a run-time setting, creating the `settings` mapping if needed.
    ///
    /// A non-mapping `settings` value is replaced.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let entry = self
            .0
            .entry(SETTINGS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(settings) = entry {
            settings.insert(key.into(), value.into());
        }
        self
    }

    /// The project name.
    pub fn project(&self) -> Result<&str, CoreError> {
        self.str_field(PROJECT_KEY)
    }

    /// The spider name.
    pub fn spider(&self) -> Result<&str, CoreError> {
        self.str_field(SPIDER_KEY)
    }

    /// The job identifier, if one was attached.
    pub fn job_id(&self) -> Option<&str> {
        self.0.get(JOB_KEY).and_then(Value::as_str)
    }

    /// Look up any key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &'static str) -> Result<&str, CoreError> {
        match self.0.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(CoreError::InvalidField(key)),
            None => Err(CoreError::MissingKey(key)),
        }
    }
}

impl From<Map<String, Value>> for JobRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
