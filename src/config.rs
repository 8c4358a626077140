//! Configuration: optional TOML file, command-line overrides, defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::ControllerOptions;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub processes: ProcessesConfig,
    pub disk: DiskConfig,
    pub files: FilesConfig,
    pub command: CommandConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Cadence for the Dashboard and Processes views
    pub interval_ms: u64,
    /// A single refresh slower than this is reported
    pub budget_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessesConfig {
    pub top: usize,
    pub terminate_grace_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub mount_point: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Defaults to the home directory, then the working directory
    pub start_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
    pub shell: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: ColorChoice,
    pub status_ttl_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            budget_ms: 1000,
        }
    }
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        Self {
            top: crate::processes::DEFAULT_TOP,
            terminate_grace_ms: 1000,
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            mount_point: crate::utils::get_root_disk_path(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            output_limit_bytes: crate::runner::DEFAULT_OUTPUT_LIMIT,
            shell: PathBuf::from("/bin/sh"),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            status_ttl_ms: 5000,
        }
    }
}

/// Values given on the command line; `None` keeps the file's setting.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub refresh_ms: Option<u64>,
    pub top: Option<usize>,
    pub mount_point: Option<PathBuf>,
    pub start_dir: Option<PathBuf>,
    pub command_timeout_secs: Option<u64>,
    pub color: Option<ColorChoice>,
}

impl Config {
    /// `<config_dir>/hostwatch/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("hostwatch").join("config.toml"))
    }

    /// Load, apply command-line overrides, then validate the merged result.
    pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, which must exist, or from the default
    /// location, where a missing file just means defaults. Not validated;
    /// overrides may still fix a bad value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path_buf, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        let config = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::parse(&raw, &path_buf)?
        } else if explicit {
            return Err(ConfigError::Missing { path: path_buf });
        } else {
            Self::default()
        };

        Ok(config)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(ms) = overrides.refresh_ms {
            self.refresh.interval_ms = ms;
        }
        if let Some(top) = overrides.top {
            self.processes.top = top;
        }
        if let Some(mount) = &overrides.mount_point {
            self.disk.mount_point = mount.clone();
        }
        if let Some(dir) = &overrides.start_dir {
            self.files.start_dir = Some(dir.clone());
        }
        if let Some(secs) = overrides.command_timeout_secs {
            self.command.timeout_secs = secs;
        }
        if let Some(color) = overrides.color {
            self.ui.color = color;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("refresh.interval_ms", self.refresh.interval_ms),
            ("refresh.budget_ms", self.refresh.budget_ms),
            ("command.timeout_secs", self.command.timeout_secs),
            ("ui.status_ttl_ms", self.ui.status_ttl_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
        }
        if self.processes.top == 0 {
            return Err(ConfigError::Invalid(
                "processes.top must be greater than 0".to_string(),
            ));
        }
        if self.command.output_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "command.output_limit_bytes must be greater than 0".to_string(),
            ));
        }
        if !self.command.shell.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "command.shell must be an absolute path, got {}",
                self.command.shell.display()
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.interval_ms)
    }

    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.processes.terminate_grace_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command.timeout_secs)
    }

    pub fn controller_options(&self, home: Option<PathBuf>) -> ControllerOptions {
        ControllerOptions {
            cadence: self.refresh_interval(),
            top_n: self.processes.top,
            command_timeout: self.command_timeout(),
            refresh_budget: Duration::from_millis(self.refresh.budget_ms),
            status_ttl: Duration::from_millis(self.ui.status_ttl_ms),
            home,
        }
    }
}
