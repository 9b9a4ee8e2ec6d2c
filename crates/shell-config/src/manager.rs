//! Configuration loading
//!
//! Sources are layered in this order, later ones winning: built-in defaults,
//! an optional TOML file, then `TOOLSHELL__*` environment variables
//! (`TOOLSHELL__INVOKER__KIND=queued`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::{debug, info};

use common::error::{Error, Result};

use crate::defaults::ShellConfig;
use crate::validation::ConfigValidator;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TOOLSHELL";

/// Holds the loaded, validated configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Effective configuration
    config: ShellConfig,

    /// File the configuration was read from, if any
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads configuration from the default location, if a file exists there
    pub fn new() -> Result<Self> {
        Self::load(None)
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (Self::default_path(), false),
        };

        let mut builder = Config::builder();

        if let Some(file) = &file {
            debug!("Reading configuration from {}", file.display());
            builder = builder.add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: ShellConfig = builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        let source = file.filter(|path| path.exists());
        if let Some(path) = &source {
            info!("Loaded configuration from {}", path.display());
        }

        let mut manager = Self::from_config(config)?;
        manager.source = source;
        Ok(manager)
    }

    /// Wraps an in-memory configuration after validating it
    pub fn from_config(config: ShellConfig) -> Result<Self> {
        ConfigValidator::validate(&config)?;
        Ok(Self {
            config,
            source: None,
        })
    }

    /// Applies a modification and re-validates
    pub fn update(&mut self, apply: impl FnOnce(&mut ShellConfig)) -> Result<()> {
        let mut next = self.config.clone();
        apply(&mut next);
        ConfigValidator::validate(&next)?;
        self.config = next;
        Ok(())
    }

    /// Gets the effective configuration
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Gets the file the configuration came from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// `<config dir>/toolshell/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("toolshell").join("config.toml"))
    }
}
