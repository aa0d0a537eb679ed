//! Initialization helpers for `.listing/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{ListingConfig, write_config};
use super::store::{STORE_SCHEMA, StoreData, write_store};

/// All canonical paths within `.listing/` for a project root.
#[derive(Debug, Clone)]
pub struct ListingPaths {
    pub root: PathBuf,
    pub listing_dir: PathBuf,
    pub config_path: PathBuf,
    pub schema_path: PathBuf,
}

impl ListingPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let listing_dir = root.join(".listing");
        Self {
            root: root.clone(),
            listing_dir: listing_dir.clone(),
            config_path: listing_dir.join("config.toml"),
            schema_path: listing_dir.join("store.schema.json"),
        }
    }

    /// Store file location as configured (relative to `.listing/`).
    pub fn store_path(&self, config: &ListingConfig) -> PathBuf {
        self.listing_dir.join(&config.store.path)
    }
}

/// Options for `init_project`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing files.
    pub force: bool,
}

/// Create `.listing/` scaffolding in `root`: default config, empty store and
/// a copy of the store schema.
///
/// Fails if `.listing/` already exists unless `options.force` is set. Forcing
/// rewrites config and schema but keeps an existing store file.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<ListingPaths> {
    let paths = ListingPaths::new(root);
    if paths.listing_dir.exists() && !options.force {
        return Err(anyhow!(
            "listing init: .listing already exists (use --force to overwrite)"
        ));
    }
    if paths.listing_dir.exists() && !paths.listing_dir.is_dir() {
        return Err(anyhow!(
            "listing init: .listing exists but is not a directory"
        ));
    }

    fs::create_dir_all(&paths.listing_dir)
        .with_context(|| format!("create directory {}", paths.listing_dir.display()))?;

    let config = ListingConfig::default();
    write_config(&paths.config_path, &config)?;
    let store_path = paths.store_path(&config);
    if store_path.exists() {
        info!(path = %store_path.display(), "keeping existing store");
    } else {
        write_store(&store_path, &StoreData::default())?;
    }
    fs::write(&paths.schema_path, STORE_SCHEMA)
        .with_context(|| format!("write file {}", paths.schema_path.display()))?;

    info!(root = %root.display(), "initialized listing project");
    Ok(paths)
}
