//! Demangler configuration and host launch flags
//!
//! [`DemanglerConfig`] holds the engine conventions the demangler keys on
//! (archive extension, filesystem type names, flag token). It can be built
//! in code, loaded from TOML, or derived from the host's `--layered-*`
//! command-line flags via [`LaunchOptions`].

use crate::error::{DemanglerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

pub const VERBOSE_FLAG: &str = "--layered-verbose";
pub const DEVMODE_FLAG: &str = "--layered-devmode";
pub const DISABLE_FLAG: &str = "--layered-disable";
pub const ALLOWLIST_FLAG: &str = "--layered-allowlist";
pub const BLOCKLIST_FLAG: &str = "--layered-blocklist";
pub const LOGFILE_FLAG: &str = "--layered-logfile";

/// Engine conventions used to recognize archive files and mount types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemanglerConfig {
    /// Extension identifying archive files (e.g. ".ifs")
    pub archive_extension: String,
    /// Filesystem type name of the RAM-backed mount
    pub ramfs_type: String,
    /// Filesystem type name of the image mount
    pub imagefs_type: String,
    /// Token preceding the buffer address in ramfs mount flags
    pub base_token: String,
    /// Separator used to join a ramfs mountpoint and its root
    pub separator: String,
    /// When false every event and query is a no-op
    pub enabled: bool,
}

impl Default for DemanglerConfig {
    fn default() -> Self {
        DemanglerConfig {
            archive_extension: ".ifs".to_string(),
            ramfs_type: "ramfs".to_string(),
            imagefs_type: "imagefs".to_string(),
            base_token: "base=".to_string(),
            separator: "/".to_string(),
            enabled: true,
        }
    }
}

impl DemanglerConfig {
    pub fn builder() -> DemanglerConfigBuilder {
        DemanglerConfigBuilder::new()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DemanglerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading demangler config from {:?}", path.as_ref());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings that would make every event unmatchable
    pub fn validate(&self) -> Result<()> {
        if self.archive_extension.is_empty() {
            return Err(DemanglerError::InvalidConfig(
                "archive_extension cannot be empty".to_string(),
            ));
        }
        if self.base_token.is_empty() {
            return Err(DemanglerError::InvalidConfig(
                "base_token cannot be empty".to_string(),
            ));
        }
        if self.ramfs_type == self.imagefs_type {
            return Err(DemanglerError::InvalidConfig(format!(
                "ramfs_type and imagefs_type must differ (both '{}')",
                self.ramfs_type
            )));
        }
        Ok(())
    }
}

/// Builder for [`DemanglerConfig`]
///
/// ```
/// use layeredfs_demangler::DemanglerConfig;
///
/// let config = DemanglerConfig::builder()
///     .archive_extension(".pak")
///     .build()
///     .unwrap();
/// assert_eq!(config.archive_extension, ".pak");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DemanglerConfigBuilder {
    config: DemanglerConfig,
}

impl DemanglerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.archive_extension = extension.into();
        self
    }

    pub fn ramfs_type(mut self, fstype: impl Into<String>) -> Self {
        self.config.ramfs_type = fstype.into();
        self
    }

    pub fn imagefs_type(mut self, fstype: impl Into<String>) -> Self {
        self.config.imagefs_type = fstype.into();
        self
    }

    pub fn base_token(mut self, token: impl Into<String>) -> Self {
        self.config.base_token = token.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn build(self) -> Result<DemanglerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Options passed to the host process on its command line
///
/// `disable` feeds [`DemanglerConfig::enabled`] and `verbose_logs` /
/// `logfile` configure the log subscriber. `developer_mode` and the
/// allow/block lists belong to the mod-override layer; they are parsed here
/// so the whole `--layered-*` family lives in one place and are otherwise
/// only reported by [`LaunchOptions::describe`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaunchOptions {
    pub verbose_logs: bool,
    pub developer_mode: bool,
    pub disable: bool,
    pub allowlist: BTreeSet<String>,
    pub blocklist: BTreeSet<String>,
    pub logfile: Option<String>,
}

impl LaunchOptions {
    /// Parse flags out of an argument list, ignoring anything unrecognized
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = LaunchOptions::default();

        for arg in args {
            let arg = arg.as_ref();
            if arg == VERBOSE_FLAG {
                options.verbose_logs = true;
            } else if arg == DEVMODE_FLAG {
                options.developer_mode = true;
            } else if arg == DISABLE_FLAG {
                options.disable = true;
            } else if let Some(value) = flag_value(arg, ALLOWLIST_FLAG) {
                parse_list(value, &mut options.allowlist);
            } else if let Some(value) = flag_value(arg, BLOCKLIST_FLAG) {
                parse_list(value, &mut options.blocklist);
            } else if let Some(value) = flag_value(arg, LOGFILE_FLAG) {
                if !value.is_empty() {
                    options.logfile = Some(value.to_string());
                }
            }
        }

        options
    }

    /// Apply the launch flags on top of an existing config
    pub fn apply_to(&self, mut config: DemanglerConfig) -> DemanglerConfig {
        if self.disable {
            config.enabled = false;
        }
        config
    }

    /// One-line summary of the effective options, for the startup log
    pub fn describe(&self) -> String {
        fn list(set: &BTreeSet<String>) -> String {
            if set.is_empty() {
                "(none)".to_string()
            } else {
                set.iter().cloned().collect::<Vec<_>>().join(",")
            }
        }

        format!(
            "Options: {}={} {}={} {}={} {}={} {}={} {}={}",
            VERBOSE_FLAG,
            self.verbose_logs as u8,
            DEVMODE_FLAG,
            self.developer_mode as u8,
            DISABLE_FLAG,
            self.disable as u8,
            LOGFILE_FLAG,
            self.logfile.as_deref().unwrap_or("(none)"),
            ALLOWLIST_FLAG,
            list(&self.allowlist),
            BLOCKLIST_FLAG,
            list(&self.blocklist),
        )
    }
}

/// Value of a `--flag=value` argument; `None` if `arg` is a different flag
/// or carries no `=`
fn flag_value<'a>(arg: &'a str, flag: &str) -> Option<&'a str> {
    arg.strip_prefix(flag)?.strip_prefix('=')
}

fn parse_list(value: &str, dest: &mut BTreeSet<String>) {
    dest.extend(
        value
            .split(',')
            .filter(|item| !item.is_empty())
            .map(|item| item.to_ascii_lowercase()),
    );
}
