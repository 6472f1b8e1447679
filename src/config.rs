//! Process-wide configuration.
//!
//! Built once at startup and passed by reference to every component that
//! needs defaults. Nothing re-reads the file per invocation.

use crate::annotate::BatchPolicy;
use crate::defaults;
use crate::error::{MausError, Result};
use crate::lexicon::MergePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub aligner: AlignerConfig,
    pub maus: MausDefaults,
    pub lexicon: LexiconConfig,
    pub batch: BatchConfig,
}

/// How the external aligner is launched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// Run a MAUS executable installed on this machine.
    #[default]
    Local,
    /// Run MAUS inside a container, mounting the working directory.
    Docker,
}

impl std::str::FromStr for RunnerKind {
    type Err = MausError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "docker" => Ok(Self::Docker),
            other => Err(MausError::ConfigInvalidValue {
                key: "aligner.runner".to_string(),
                message: format!("unknown runner '{}', expected 'local' or 'docker'", other),
            }),
        }
    }
}

/// Aligner location configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignerConfig {
    pub runner: RunnerKind,
    /// Local MAUS executable (used by the `local` runner).
    pub path: String,
    /// Container runtime binary (used by the `docker` runner).
    pub docker: String,
    pub image: String,
    /// MAUS executable path inside the image.
    pub container_path: String,
}

/// Default value for every recognized MAUS parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MausDefaults {
    pub language: String,
    pub canonly: bool,
    pub minpauslen: u32,
    pub startword: u32,
    pub endword: u32,
    pub mausshift: f64,
    pub insprob: f64,
    pub usetrn: bool,
    pub outformat: String,
    pub inskantextgrid: bool,
    pub insorttextgrid: bool,
}

/// Lexicon configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LexiconConfig {
    /// Directory loaded when no lexicon directory is given explicitly.
    pub dir: Option<PathBuf>,
    pub merge: MergePolicy,
}

/// Batch annotation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BatchConfig {
    pub policy: BatchPolicy,
    /// Where per-recording audio is materialized. System temp dir if unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            runner: RunnerKind::Local,
            path: defaults::MAUS_PATH.to_string(),
            docker: defaults::DOCKER.to_string(),
            image: defaults::DOCKER_IMAGE.to_string(),
            container_path: defaults::CONTAINER_MAUS_PATH.to_string(),
        }
    }
}

impl Default for MausDefaults {
    fn default() -> Self {
        Self {
            language: defaults::LANGUAGE.to_string(),
            canonly: defaults::CANONLY,
            minpauslen: defaults::MINPAUSLEN,
            startword: defaults::STARTWORD,
            endword: defaults::ENDWORD,
            mausshift: defaults::MAUSSHIFT,
            insprob: defaults::INSPROB,
            usetrn: defaults::USETRN,
            outformat: defaults::OUTFORMAT.to_string(),
            inskantextgrid: defaults::INSKANTEXTGRID,
            insorttextgrid: defaults::INSORTTEXTGRID,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values. A missing file is
    /// `ConfigFileNotFound`, invalid TOML is `Config`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MausError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                MausError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(MausError::ConfigFileNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MAUS_PATH → aligner.path
    /// - MAUS_RUNNER → aligner.runner
    /// - MAUS_LANGUAGE → maus.language
    /// - MAUS_LEXICON_DIR → lexicon.dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("MAUS_PATH")
            && !path.is_empty()
        {
            self.aligner.path = path;
        }

        if let Ok(runner) = std::env::var("MAUS_RUNNER")
            && !runner.is_empty()
        {
            match runner.parse() {
                Ok(kind) => self.aligner.runner = kind,
                Err(e) => tracing::warn!("ignoring MAUS_RUNNER: {}", e),
            }
        }

        if let Ok(language) = std::env::var("MAUS_LANGUAGE")
            && !language.is_empty()
        {
            self.maus.language = language;
        }

        if let Ok(dir) = std::env::var("MAUS_LEXICON_DIR")
            && !dir.is_empty()
        {
            self.lexicon.dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Check values that TOML typing alone cannot catch.
    pub fn validate(&self) -> Result<()> {
        match self.aligner.runner {
            RunnerKind::Local if self.aligner.path.trim().is_empty() => {
                return Err(invalid("aligner.path", "must not be empty"));
            }
            RunnerKind::Docker if self.aligner.image.trim().is_empty() => {
                return Err(invalid("aligner.image", "must not be empty"));
            }
            RunnerKind::Docker if self.aligner.docker.trim().is_empty() => {
                return Err(invalid("aligner.docker", "must not be empty"));
            }
            _ => {}
        }

        if self.maus.language.trim().is_empty() {
            return Err(invalid("maus.language", "must not be empty"));
        }
        if self.maus.outformat.trim().is_empty() {
            return Err(invalid("maus.outformat", "must not be empty"));
        }
        if self.maus.startword > self.maus.endword {
            return Err(invalid(
                "maus.startword",
                &format!(
                    "{} is after maus.endword {}",
                    self.maus.startword, self.maus.endword
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.maus.insprob) {
            return Err(invalid("maus.insprob", "must be between 0.0 and 1.0"));
        }

        Ok(())
    }

    /// Render the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MausError::Other(e.to_string()))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/maus-align/config.toml on Linux, `None` when the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_NAME).join("config.toml"))
    }
}

fn invalid(key: &str, message: &str) -> MausError {
    MausError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
