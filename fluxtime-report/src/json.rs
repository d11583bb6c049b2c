//! JSON Output

use crate::format::TimingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine-readable summary of an aggregated run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub schema_version: u32,
    /// fluxtime version that produced the report
    pub version: String,
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    /// Result name, if any
    pub name: Option<String>,
    /// Mean of all samples, in seconds
    pub mean: Option<f64>,
    /// Sample standard deviation, in seconds (needs two samples)
    pub stdev: Option<f64>,
    /// Human-readable rendering of the result
    pub formatted: String,
    /// Every sample, in seconds, in arrival order
    pub values: Vec<f64>,
    /// Provenance metadata
    pub metadata: BTreeMap<String, String>,
}

impl RunReport {
    /// Build a report from an aggregated result
    pub fn from_result(result: &TimingResult) -> Self {
        Self {
            schema_version: 1,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            name: result.name().map(str::to_string),
            mean: result.mean().ok(),
            stdev: result.stdev().ok(),
            formatted: result.to_string(),
            values: result.values().to_vec(),
            metadata: result.metadata().clone(),
        }
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(result: &TimingResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RunReport::from_result(result))
}
