//! Configuration loading for fattrace
//!
//! Loads defaults from a `fattrace.toml`, found by walking up from the working
//! directory, and merges them with command line arguments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::render::{ColorChoice, RenderOptions};

pub const CONFIG_FILE_NAME: &str = "fattrace.toml";

/// Settings read from `fattrace.toml`; unset fields keep the defaults
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sequence elements shown before truncation
    pub threshold: Option<usize>,

    /// Expand `self` attributes inline
    pub include_self: Option<bool>,

    /// Show `__`-prefixed names
    pub include_private: Option<bool>,

    /// Variable names to skip
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Type names to skip
    #[serde(default)]
    pub ignore_type: Vec<String>,

    pub color: Option<ColorChoice>,

    /// Exit with status 1 after rendering
    pub exit: Option<bool>,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub threshold: Option<usize>,
    pub no_self: bool,
    pub include_private: bool,
    pub ignore: Vec<String>,
    pub ignore_type: Vec<String>,
    pub color: Option<ColorChoice>,
    pub exit: bool,
}

/// Find `fattrace.toml` starting from a path and walking up
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_file() {
        start_path.parent()?
    } else {
        start_path
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        current = current.parent()?;
    }
}

/// Load configuration from `path`, or discover it from the working directory.
///
/// Returns `Ok(None)` when no file is given and none is found.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let Ok(cwd) = std::env::current_dir() else {
                return Ok(None);
            };
            match find_config_file(&cwd) {
                Some(found) => found,
                None => return Ok(None),
            }
        }
    };

    log::debug!("loading config from {}", config_path.display());

    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: config_path,
        source,
    })?;

    Ok(Some(config))
}

/// Merge command line arguments with config file settings.
/// CLI arguments take precedence; ignore lists are combined. Unlike the
/// library default, the merged options only exit when asked to.
pub fn merge_config(config: Option<&Config>, cli: &CliOverrides) -> RenderOptions {
    let mut options = RenderOptions::default().exit(false);

    if let Some(cfg) = config {
        if let Some(threshold) = cfg.threshold {
            options.threshold = threshold;
        }
        if let Some(include_self) = cfg.include_self {
            options.include_self = include_self;
        }
        if let Some(include_private) = cfg.include_private {
            options.include_private = include_private;
        }
        if let Some(color) = cfg.color {
            options.color = color;
        }
        if let Some(exit) = cfg.exit {
            options.exit = exit;
        }
        options.ignore.extend(cfg.ignore.iter().cloned());
        options.ignore_type.extend(cfg.ignore_type.iter().cloned());
    }

    if let Some(threshold) = cli.threshold {
        options.threshold = threshold;
    }
    if cli.no_self {
        options.include_self = false;
    }
    if cli.include_private {
        options.include_private = true;
    }
    if let Some(color) = cli.color {
        options.color = color;
    }
    if cli.exit {
        options.exit = true;
    }
    options.ignore.extend(cli.ignore.iter().cloned());
    options.ignore_type.extend(cli.ignore_type.iter().cloned());

    options
}
