//! YAML configuration parsing.
//!
//! Parses chain settings and scores from YAML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::ConfigError;

/// Chain-wide settings, shared by every continuation of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Name used in log output.
    pub name: String,
    /// Delay join tokens until the scheduler turn after their registration.
    /// Turning this off lets a token fired synchronously complete a join
    /// before its siblings are registered.
    pub arm_joins: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            name: "rytm".to_string(),
            arm_joins: true,
        }
    }
}

/// A declarative chain: settings plus an ordered list of beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(flatten)]
    pub chain: ChainConfig,
    /// Beats, played in order.
    pub beats: Vec<BeatConfig>,
}

/// One beat of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatConfig {
    /// Log a line with the received arguments and continue with them.
    Log(String),
    /// Pause for this many milliseconds, forwarding arguments.
    Wait(u64),
    /// Start one timer per entry and continue once all have fired.
    All(Vec<u64>),
    /// Start one timer per entry and continue when the first fires.
    Once(Vec<u64>),
    /// Continue immediately with this value.
    Emit(serde_json::Value),
}

impl BeatConfig {
    /// Short kind name for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            BeatConfig::Log(_) => "log",
            BeatConfig::Wait(_) => "wait",
            BeatConfig::All(_) => "all",
            BeatConfig::Once(_) => "once",
            BeatConfig::Emit(_) => "emit",
        }
    }
}

/// YAML configuration loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load a score from a file.
    pub fn load_score(path: impl AsRef<Path>) -> Result<ScoreConfig, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse_score(&content)
    }

    /// Parse a score from a YAML string.
    pub fn parse_score(yaml: &str) -> Result<ScoreConfig, ConfigError> {
        let score: ScoreConfig = serde_yaml::from_str(yaml)?;
        Self::validate_score(&score)?;
        Ok(score)
    }

    /// Parse chain settings from a YAML string.
    pub fn parse_chain_config(yaml: &str) -> Result<ChainConfig, ConfigError> {
        let config: ChainConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    fn validate_score(score: &ScoreConfig) -> Result<(), ConfigError> {
        if score.chain.name.is_empty() {
            return Err(ConfigError::MissingField("name".into()));
        }

        if score.beats.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "score must have at least one beat".into(),
            ));
        }

        for (i, beat) in score.beats.iter().enumerate() {
            let empty = match beat {
                BeatConfig::All(delays) | BeatConfig::Once(delays) => delays.is_empty(),
                _ => false,
            };
            if empty {
                return Err(ConfigError::InvalidConfig(format!(
                    "beat {} ({}) needs at least one delay",
                    i,
                    beat.kind()
                )));
            }
        }

        Ok(())
    }
}
