// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading and merging.
//!
//! Sources, in increasing precedence:
//! - defaults
//! - global config: `~/.kbchat/config.json`
//! - workspace config: `.kbchat.json` in the working directory
//! - CLI options (flags and `KBCHAT_*` environment variables via clap)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::inline::DEFAULT_ORIGIN;

/// Global config directory name under the home directory.
pub const GLOBAL_CONFIG_DIR: &str = ".kbchat";
/// Workspace config file name.
pub const WORKSPACE_CONFIG_FILE: &str = ".kbchat.json";

/// Partial configuration as read from one file. Every field optional;
/// merging fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_folder: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_tail: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// CLI-level overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub kb_folder: Option<PathBuf>,
    pub history_tail: Option<usize>,
    pub origin: Option<String>,
    pub log_level: Option<String>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Folder scanned for knowledge-base files.
    pub kb_folder: Option<PathBuf>,
    /// How many trailing messages feed the model on each turn.
    pub history_tail: usize,
    /// Origin used to resolve relative link targets.
    pub origin: String,
    /// Default tracing filter level.
    pub log_level: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            kb_folder: None,
            history_tail: 12,
            origin: DEFAULT_ORIGIN.to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Path of the global config file, if a home directory exists.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR).join("config.json"))
}

/// Load one config file. A missing file is `Ok(None)`; malformed JSON
/// is an error rather than a silent default.
pub fn load_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Merge all sources with precedence CLI > workspace > global > defaults.
pub fn merge_config(
    global: Option<ConfigFile>,
    workspace: Option<ConfigFile>,
    cli: CliOptions,
) -> Result<ResolvedConfig, ConfigError> {
    let mut resolved = ResolvedConfig::default();
    for file in [global, workspace].into_iter().flatten() {
        if let Some(folder) = file.kb_folder {
            resolved.kb_folder = Some(folder);
        }
        if let Some(tail) = file.history_tail {
            resolved.history_tail = tail;
        }
        if let Some(origin) = file.origin {
            resolved.origin = origin;
        }
        if let Some(level) = file.log_level {
            resolved.log_level = level;
        }
    }
    if let Some(folder) = cli.kb_folder {
        resolved.kb_folder = Some(folder);
    }
    if let Some(tail) = cli.history_tail {
        resolved.history_tail = tail;
    }
    if let Some(origin) = cli.origin {
        resolved.origin = origin;
    }
    if let Some(level) = cli.log_level {
        resolved.log_level = level;
    }

    if resolved.history_tail == 0 {
        return Err(ConfigError::Invalid(
            "history_tail must be at least 1".to_string(),
        ));
    }
    url::Url::parse(&resolved.origin)
        .map_err(|e| ConfigError::Invalid(format!("origin is not a valid URL: {e}")))?;
    Ok(resolved)
}

/// Load and merge configuration for a workspace directory.
pub fn load_config(workspace_root: &Path, cli: CliOptions) -> Result<ResolvedConfig, ConfigError> {
    let global = match global_config_path() {
        Some(path) => load_config_file(&path)?,
        None => None,
    };
    let workspace = load_config_file(&workspace_root.join(WORKSPACE_CONFIG_FILE))?;
    merge_config(global, workspace, cli)
}
