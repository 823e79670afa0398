use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::error::{ExportError, Result};
use crate::figma::{FigmaAuth, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::format::{validate_scale, ImageFormat, DEFAULT_SCALE};
use crate::persist::DEFAULT_CONCURRENCY;
use crate::render::RenderOptions;
use crate::selector::{NodeFilter, DEFAULT_NODE_TYPE};

pub const DEFAULT_IMAGE_SAVE_PATH: &str = "./figma/images";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Defaults loaded from a TOML config file; CLI flags override them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub access_token: Option<String>,
    pub image_save_path: PathBuf,
    pub node_types: String,
    pub ignore_node_name: Option<String>,
    pub scale: f32,
    pub format: ImageFormat,
    pub concurrency: usize,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            image_save_path: PathBuf::from(DEFAULT_IMAGE_SAVE_PATH),
            node_types: DEFAULT_NODE_TYPE.to_string(),
            ignore_node_name: None,
            scale: DEFAULT_SCALE,
            format: ImageFormat::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            api_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads `path` if given, else the central config if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::central_config_path().filter(|p| p.is_file()) {
                Some(central) => Self::from_file(&central),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$XDG_CONFIG_HOME/fex/config.toml`, falling back to `~/.config/fex/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join("fex").join("config.toml"))
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_scale(self.scale).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.node_types.split(',').all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "node_types must name at least one node type".to_string(),
            ));
        }
        if self.image_save_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "image_save_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// The fully resolved configuration consumed by [`crate::Exporter`].
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub url: String,
    pub auth: FigmaAuth,
    pub image_save_path: PathBuf,
    pub node_types: String,
    pub ignore_node_name: Option<String>,
    pub scale: f32,
    pub format: ImageFormat,
    pub concurrency: usize,
    pub timeout: Duration,
    pub api_base_url: String,
}

impl ExportSettings {
    /// Settings with file-config defaults for everything but the URL and credential.
    pub fn new(url: impl Into<String>, auth: FigmaAuth) -> Self {
        Self::from_config(url, auth, &Config::default())
    }

    pub fn from_config(url: impl Into<String>, auth: FigmaAuth, config: &Config) -> Self {
        Self {
            url: url.into(),
            auth,
            image_save_path: config.image_save_path.clone(),
            node_types: config.node_types.clone(),
            ignore_node_name: config.ignore_node_name.clone(),
            scale: config.scale,
            format: config.format,
            concurrency: config.concurrency,
            timeout: config.timeout,
            api_base_url: config.api_base_url.clone(),
        }
    }

    pub fn node_filter(&self) -> Result<NodeFilter> {
        NodeFilter::parse(&self.node_types, self.ignore_node_name.as_deref())
    }

    pub fn render_options(&self) -> Result<RenderOptions> {
        RenderOptions::new(self.scale, self.format)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ExportError::Config("a Figma file URL is required".into()));
        }
        if self.concurrency == 0 {
            return Err(ExportError::Config(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ExportError::Config(
                "timeout must be greater than zero".into(),
            ));
        }
        self.render_options()?;
        self.node_filter()?;
        Ok(())
    }
}
