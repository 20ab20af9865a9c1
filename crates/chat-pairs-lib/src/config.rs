/*
Pipeline and output configuration.

Design notes:
- Defaults mirror the values the tool has always used: windows of at most
  four messages (three context messages plus the reply) and a 24 hour decay
  threshold measured from the reply.
- Every field can come from a TOML file; the CLI overlays its flags on top.
*/

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PairsError, Result};

/// Default maximum number of messages in one context window.
pub const DEFAULT_MAX_WINDOW: usize = 4;
/// Default decay threshold: 24 hours.
pub const DEFAULT_DECAY_SECONDS: i64 = 60 * 60 * 24;
/// Default sink destination.
pub const DEFAULT_OUTPUT_PATH: &str = "result.csv";

/// Order in which the messages of one side are concatenated.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcatOrder {
    /// Window order: newest message first. Historical behaviour.
    #[default]
    AsStored,
    /// Oldest message first.
    Chronological,
}

impl ConcatOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AsStored => "as_stored",
            Self::Chronological => "chronological",
        }
    }
}

/// Tabular encoding of the sink.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(PairsError::configuration(format!(
                "unsupported output format '{other}'; supported: csv|jsonl"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Knobs of the windowing pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum window size *M*, anchor included.
    pub max_window: usize,
    /// Decay threshold *T* in seconds, measured from the anchor.
    pub decay_seconds: i64,
    pub concat_order: ConcatOrder,
    /// Extra filter: messages whose text matches any of these are dropped.
    pub drop_patterns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_window: DEFAULT_MAX_WINDOW,
            decay_seconds: DEFAULT_DECAY_SECONDS,
            concat_order: ConcatOrder::default(),
            drop_patterns: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Check ranges and compile the drop patterns.
    pub fn validate(&self) -> Result<()> {
        if self.max_window == 0 {
            return Err(PairsError::configuration("max_window must be at least 1"));
        }
        if self.decay_seconds < 0 {
            return Err(PairsError::configuration(format!(
                "decay_seconds must not be negative (got {})",
                self.decay_seconds
            )));
        }
        self.compiled_drop_patterns().map(|_| ())
    }

    pub fn compiled_drop_patterns(&self) -> Result<Vec<Regex>> {
        self.drop_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    PairsError::configuration(format!("invalid drop pattern '{p}': {e}"))
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            format: OutputFormat::default(),
        }
    }
}

/// Top-level configuration file.
///
/// ```toml
/// [pipeline]
/// max_window = 6
/// decay_seconds = 3600
/// concat_order = "chronological"
///
/// [output]
/// path = "pairs.csv"
/// format = "csv"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| PairsError::configuration(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()
    }
}
