//! Durable job definitions and their parameter maps.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{JobError, Result};

/// What should be running for one job id: the job type plus its parameters.
///
/// Definitions are immutable once stored; replacing one requires stop + start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub job_type: String,
    #[serde(default)]
    pub params: JobParams,
}

/// Flat string-keyed parameter map. Scalar values only, no nesting, so the
/// stored record format stays simple and forward-compatible.
pub type JobParams = BTreeMap<String, ParamValue>;

/// A single scalar job parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Fetch a required string parameter.
pub fn require_str<'a>(params: &'a JobParams, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(ParamValue::as_str)
        .ok_or_else(|| JobError::InvalidParams(format!("missing string parameter '{key}'")))
}

/// Fetch a required positive duration, given in seconds.
pub fn require_secs(params: &JobParams, key: &str) -> Result<Duration> {
    let value = params
        .get(key)
        .and_then(ParamValue::as_f64)
        .ok_or_else(|| JobError::InvalidParams(format!("missing numeric parameter '{key}'")))?;

    if value <= 0.0 || !value.is_finite() {
        return Err(JobError::InvalidParams(format!(
            "parameter '{key}' must be a positive number of seconds"
        )));
    }

    Ok(Duration::from_secs_f64(value))
}

/// Fetch an optional positive duration, given in seconds.
pub fn optional_secs(params: &JobParams, key: &str, default: Duration) -> Result<Duration> {
    if params.contains_key(key) {
        require_secs(params, key)
    } else {
        Ok(default)
    }
}
