use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which a launch timestamp is stored to make each run unique
pub const RUN_TIMESTAMP_KEY: &str = "run.timestamp";

/// Single opaque launch parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobParameter {
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
    String(String),
}

impl std::fmt::Display for JobParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.to_rfc3339()),
            Self::String(v) => write!(f, "{v}"),
        }
    }
}

/// Opaque key/value inputs of one job run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    parameters: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> JobParametersBuilder {
        JobParametersBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.parameters.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.parameters.get(key) {
            Some(JobParameter::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.parameters.get(key) {
            Some(JobParameter::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JobParameter)> {
        self.parameters.iter()
    }
}

#[derive(Debug, Default)]
pub struct JobParametersBuilder {
    parameters: BTreeMap<String, JobParameter>,
}

impl JobParametersBuilder {
    pub fn add_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .insert(key.into(), JobParameter::String(value.into()));
        self
    }

    pub fn add_long(mut self, key: impl Into<String>, value: i64) -> Self {
        self.parameters.insert(key.into(), JobParameter::Long(value));
        self
    }

    pub fn add_double(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), JobParameter::Double(value));
        self
    }

    pub fn add_date(mut self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.parameters.insert(key.into(), JobParameter::Date(value));
        self
    }

    /// Stamp the run with the current time in milliseconds
    pub fn add_run_timestamp(self) -> Self {
        let millis = Utc::now().timestamp_millis();
        self.add_long(RUN_TIMESTAMP_KEY, millis)
    }

    pub fn build(self) -> JobParameters {
        JobParameters {
            parameters: self.parameters,
        }
    }
}
