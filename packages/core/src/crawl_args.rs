//! Command-line arguments for a crawl process.
//!
//! A [`JobRequest`] becomes `<spider> [-a key=value]... [-s key=value]...`.
//! Keys are emitted in lexicographic order within each group so the same
//! request always yields the same command line.

use serde_json::{Map, Value};

use crate::CoreError;
use crate::job::{JobRequest, PROJECT_KEY, SETTINGS_KEY, SPIDER_KEY};

/// Flag preceding each spider argument.
pub const ARG_FLAG: &str = "-a";
/// Flag preceding each setting.
pub const SETTING_FLAG: &str = "-s";

/// Coerce a JSON value to the text passed on the command line.
///
/// Strings pass through unchanged. Everything else uses its compact JSON form.
pub fn coerce_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the argument vector for `request`.
///
/// The request is not modified. Fails when `_spider` or `_project` is missing
/// or when `settings` is present but is not a mapping.
pub fn crawl_args(request: &JobRequest) -> Result<Vec<String>, CoreError> {
    let mut params = request.as_map().clone();

    let spider = params
        .remove(SPIDER_KEY)
        .ok_or(CoreError::MissingKey(SPIDER_KEY))?;
    params
        .remove(PROJECT_KEY)
        .ok_or(CoreError::MissingKey(PROJECT_KEY))?;

    let settings = match params.remove(SETTINGS_KEY) {
        None => Map::new(),
        Some(Value::Object(settings)) => settings,
        Some(_) => return Err(CoreError::InvalidSettings),
    };

    let mut args = vec![coerce_arg(&spider)];
    push_pairs(&mut args, ARG_FLAG, &params);
    push_pairs(&mut args, SETTING_FLAG, &settings);
    Ok(args)
}

fn push_pairs(args: &mut Vec<String>, flag: &str, entries: &Map<String, Value>) {
    let mut pairs: Vec<(&String, &Value)> = entries.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in pairs {
        args.push(flag.to_string());
        args.push(format!("{}={}", key, coerce_arg(value)));
    }
}

impl JobRequest {
    /// Build the argument vector for this request. See [`crawl_args`].
    pub fn crawl_args(&self) -> Result<Vec<String>, CoreError> {
        crawl_args(self)
    }
}
