//! Configuration loading from fluxtime.toml
//!
//! Runner defaults can be specified in a `fluxtime.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Command line flags always win over file values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up by [`FluxtimeConfig::discover`]
pub const CONFIG_FILE: &str = "fluxtime.toml";

/// fluxtime configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FluxtimeConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Where workers run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// Each worker is a fresh child process (default)
    #[default]
    Process,
    /// Workers are plain loops inside the harness process
    InProcess,
}

impl IsolationMode {
    /// Whether this mode provides process isolation
    pub fn is_isolated(self) -> bool {
        matches!(self, IsolationMode::Process)
    }
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Number of workers run one after the other
    #[serde(default = "default_processes")]
    pub processes: usize,
    /// Timed batches per worker
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    /// Per-worker timeout (e.g., "30s", "5m"); unset means no timeout
    #[serde(default)]
    pub timeout: Option<String>,
    /// Isolation mode: "process" or "in-process"
    #[serde(default)]
    pub isolation: IsolationMode,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            processes: default_processes(),
            repeat: default_repeat(),
            timeout: None,
            isolation: IsolationMode::default(),
        }
    }
}

fn default_processes() -> usize {
    3
}
fn default_repeat() -> usize {
    3
}

impl RunnerConfig {
    /// Parsed worker timeout. `"0s"` disables the timeout like an unset key.
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        match self.timeout.as_deref() {
            None => Ok(None),
            Some(text) => {
                let nanos = FluxtimeConfig::parse_duration(text)?;
                Ok((nanos > 0).then(|| Duration::from_nanos(nanos)))
            }
        }
    }
}

impl FluxtimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), "ignoring config: {e:#}");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
