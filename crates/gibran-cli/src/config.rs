//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only ever sees the values derived
//! from it ([`Markers`], [`ResolverConfig`]).
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (applied at the call-site, not here)
//! 2. Environment variables, `GIBRAN__SECTION__KEY`
//! 3. `gibran.toml` in the project root
//! 4. Config file (`--config` or the per-user path)
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::process::Command;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use gibran_core::domain::{MarkerMatching, Markers, ResolverConfig};

use crate::error::{CliError, CliResult};

/// File name of the project-local configuration.
pub const LOCAL_CONFIG_FILE: &str = "gibran.toml";

const ENV_PREFIX: &str = "GIBRAN";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File-name markers.
    pub markers: MarkerConfig,
    /// Where imports are looked up.
    pub resolver: ResolverSection,
    /// Broker regeneration settings.
    pub run: RunConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub generated: String,
    pub broker: String,
    pub matching: MarkerMatching,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            generated: "@".into(),
            broker: "broker".into(),
            matching: MarkerMatching::Substring,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    pub search_paths: Vec<PathBuf>,
    pub goroot: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Worker count; 0 means available parallelism.
    pub jobs: usize,
    pub broker_template: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration, layering every source over the defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; when absent
    /// the per-user file from [`Self::config_path`] is used and may be
    /// missing.  `project_root`, when given, contributes its `gibran.toml`.
    pub fn load(config_file: Option<&Path>, project_root: Option<&Path>) -> CliResult<Self> {
        let user_file = config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;
        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(user_file).required(config_file.is_some()));

        if let Some(root) = project_root {
            builder = builder.add_source(File::from(root.join(LOCAL_CONFIG_FILE)).required(false));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("resolver.search_paths"),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }

    /// Path to the per-user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `gibran.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "gibran", "gibran")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Marker set, with an optional matching override from the command line.
    pub fn markers(&self, matching: Option<MarkerMatching>) -> CliResult<Markers> {
        Markers::new(
            self.markers.generated.clone(),
            self.markers.broker.clone(),
            matching.unwrap_or(self.markers.matching),
        )
        .map_err(|e| CliError::ConfigError {
            message: format!("invalid markers: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Resolver settings with `extra` search paths appended.
    ///
    /// The goroot is the `goroot` flag, else `resolver.goroot`, else the
    /// installed toolchain's root (see [`detect_goroot`]).
    pub fn resolver_config(&self, extra: &[PathBuf], goroot: Option<&Path>) -> ResolverConfig {
        self.resolver_config_with(extra, goroot, detect_goroot)
    }

    fn resolver_config_with(
        &self,
        extra: &[PathBuf],
        goroot: Option<&Path>,
        detect: impl FnOnce() -> Option<PathBuf>,
    ) -> ResolverConfig {
        let mut search_paths = self.resolver.search_paths.clone();
        search_paths.extend(extra.iter().cloned());
        let goroot = goroot
            .map(Path::to_path_buf)
            .or_else(|| self.resolver.goroot.clone())
            .or_else(detect);
        ResolverConfig::new(search_paths, goroot)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::ConfigError {
            message: "could not serialise configuration".into(),
            source: Some(Box::new(e)),
        })
    }
}

/// Root of the local Go toolchain: `$GOROOT`, else `go env GOROOT`.
///
/// `None` when neither names an existing directory; standard-library
/// imports then stay unresolved.
pub fn detect_goroot() -> Option<PathBuf> {
    let from_env = std::env::var_os("GOROOT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let root = from_env.or_else(|| {
        let out = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
        let text = String::from_utf8(out.stdout).ok()?;
        let text = text.trim();
        (out.status.success() && !text.is_empty()).then(|| PathBuf::from(text))
    })?;

    if root.is_dir() {
        debug!(goroot = %root.display(), "Detected Go toolchain");
        Some(root)
    } else {
        debug!(goroot = %root.display(), "Ignoring missing GOROOT");
        None
    }
}

fn config_error(e: config::ConfigError) -> CliError {
    CliError::ConfigError {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}
