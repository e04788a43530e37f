use super::OutputFormat;
use clap::ValueEnum;
use cypher_builder::query::BuilderOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    default_format: Option<OutputFormat>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = if let Some(config_path) = path.as_ref() {
            if config_path.exists() {
                read_file(config_path)?
            } else {
                RawConfig::default()
            }
        } else {
            RawConfig::default()
        };
        let default_format = parse_format(&data)?;
        Ok(Self {
            path,
            data,
            default_format,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn builder_options(&self) -> &BuilderOptions {
        &self.data.builder
    }

    pub fn default_format(&self) -> Option<OutputFormat> {
        self.default_format
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_format(data: &RawConfig) -> Result<Option<OutputFormat>, ConfigError> {
    match data.default_format.as_deref() {
        Some(value) => OutputFormat::from_str(value, true)
            .map(Some)
            .map_err(|_| ConfigError::InvalidFormat {
                value: value.to_string(),
            }),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    builder: BuilderOptions,
    #[serde(default)]
    default_format: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("default_format value '{value}' is invalid (expected text or json)")]
    InvalidFormat { value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("cypher-builder").join("cli.toml"))
}
