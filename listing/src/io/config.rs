//! Project configuration stored under `.listing/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Listing configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ListingConfig {
    pub wizard: WizardConfig,
    pub messages: MessagesConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct WizardConfig {
    /// Block `Next` on intermediate steps while the step has invalid required fields.
    pub strict_step_gating: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MessagesConfig {
    /// Toast shown after a listing was created.
    pub created: String,
    /// Toast shown when the create request failed.
    pub failed: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            created: "Listing created successfully!".to_string(),
            failed: "Something went wrong, please try again later".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file name, relative to `.listing/`.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "store.json".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.messages.created.trim().is_empty() {
            return Err(anyhow!("messages.created must be non-empty"));
        }
        if self.messages.failed.trim().is_empty() {
            return Err(anyhow!("messages.failed must be non-empty"));
        }
        if self.store.path.trim().is_empty() {
            return Err(anyhow!("store.path must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ListingConfig::default()`.
pub fn load_config(path: &Path) -> Result<ListingConfig> {
    if !path.exists() {
        let cfg = ListingConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ListingConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ListingConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
