//! Configuration loading and parsing.
//!
//! This module provides chain configuration and YAML "scores": declarative
//! chains the `rytm` binary can play.

mod builder;
mod error;
mod yaml;

pub use error::ConfigError;
pub use yaml::{BeatConfig, ChainConfig, ScoreConfig, YamlLoader};
