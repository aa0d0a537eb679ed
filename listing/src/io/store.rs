//! Persistence collaborator: listing and user storage.
//!
//! [`ListingStore`] and [`UserStore`] decouple the wizard and the favorite
//! operations from the storage backend. [`JsonStore`] keeps everything in a
//! single JSON document (`.listing/store.json`), validated against the bundled
//! schema on load and rewritten atomically after every mutation. Tests use
//! scripted stores that return predetermined outcomes.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::core::counter::MIN_COUNT;
use crate::core::types::{Listing, ListingDraft, User};

pub const STORE_SCHEMA: &str = include_str!("../../schemas/store.schema.json");

/// Create and list listings.
pub trait ListingStore {
    /// Persist a new listing owned by `owner_id`. Exactly one write per call.
    fn create_listing(
        &self,
        owner_id: &str,
        draft: ListingDraft,
    ) -> impl Future<Output = Result<Listing>> + Send;

    fn listings(&self) -> impl Future<Output = Result<Vec<Listing>>> + Send;
}

/// Resolve users and replace their favorite sets.
pub trait UserStore {
    fn find_user(&self, user_id: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Replace the user's favorite sequence; fails if the user does not exist.
    fn update_favorites(
        &self,
        user_id: &str,
        favorite_ids: Vec<String>,
    ) -> impl Future<Output = Result<User>> + Send;
}

/// On-disk document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    pub users: Vec<User>,
    pub listings: Vec<Listing>,
}

/// Load and schema-validate the store document. A missing file is an empty store.
pub fn load_store(path: &Path) -> Result<StoreData> {
    if !path.exists() {
        debug!(path = %path.display(), "store missing, starting empty");
        return Ok(StoreData::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read store {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse store {}", path.display()))?;
    validate_schema(&value).with_context(|| format!("validate store {}", path.display()))?;
    let data: StoreData = serde_json::from_value(value)
        .with_context(|| format!("deserialize store {}", path.display()))?;
    debug!(
        users = data.users.len(),
        listings = data.listings.len(),
        "store loaded"
    );
    Ok(data)
}

/// Atomically write the store document (temp file + rename).
pub fn write_store(path: &Path, data: &StoreData) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(data).context("serialize store")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("store path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp store {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace store {}", path.display()))?;
    Ok(())
}

fn validate_schema(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(STORE_SCHEMA).context("parse store schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile store schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("store schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

/// Reject drafts the store schema would not accept.
fn validate_draft(draft: &ListingDraft) -> Result<()> {
    let mut problems = Vec::new();
    if draft.title.trim().is_empty() {
        problems.push("title is required");
    }
    if draft.description.trim().is_empty() {
        problems.push("description is required");
    }
    if draft.price == 0 {
        problems.push("price must be at least 1");
    }
    if [draft.guest_count, draft.room_count, draft.bathroom_count]
        .iter()
        .any(|&n| n < MIN_COUNT)
    {
        problems.push("counts must be at least 1");
    }
    if !problems.is_empty() {
        bail!("invalid listing payload: {}", problems.join(", "));
    }
    Ok(())
}

fn new_object_id() -> String {
    hex::encode(rand::random::<[u8; 12]>())
}

/// JSON-file backed store.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = load_store(&path)?;
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file. Returns true if the in-memory data changed.
    ///
    /// The file is read under the lock so a concurrent `mutate` cannot commit
    /// between the read and the replace.
    pub fn reload(&self) -> Result<bool> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let fresh = load_store(&self.path)?;
        if *data == fresh {
            return Ok(false);
        }
        *data = fresh;
        Ok(true)
    }

    pub fn snapshot(&self) -> Result<StoreData> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(data.clone())
    }

    /// Register a new user with an empty favorite set.
    pub fn add_user(&self, name: &str, email: &str) -> Result<User> {
        if name.trim().is_empty() {
            bail!("user name must be non-empty");
        }
        let user = User {
            id: new_object_id(),
            name: name.to_string(),
            email: email.to_string(),
            favorite_ids: Vec::new(),
        };
        self.mutate(|data| {
            if data.users.iter().any(|u| u.email == email) {
                bail!("user with email {} already exists", email);
            }
            data.users.push(user.clone());
            Ok(())
        })?;
        info!(user_id = %user.id, "user added");
        Ok(user)
    }

    /// Apply `f` to a copy of the data, persist it, then commit in memory.
    ///
    /// Nothing changes (on disk or in memory) if `f` or the write fails.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let mut next = data.clone();
        let out = f(&mut next)?;
        write_store(&self.path, &next)?;
        *data = next;
        debug!(path = %self.path.display(), "store written");
        Ok(out)
    }
}

impl ListingStore for JsonStore {
    #[instrument(skip_all, fields(owner_id = %owner_id))]
    async fn create_listing(&self, owner_id: &str, draft: ListingDraft) -> Result<Listing> {
        validate_draft(&draft)?;
        let listing = Listing {
            id: new_object_id(),
            user_id: owner_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            draft,
        };
        self.mutate(|data| {
            if !data.users.iter().any(|u| u.id == owner_id) {
                bail!("user {} not found", owner_id);
            }
            data.listings.push(listing.clone());
            Ok(())
        })?;
        info!(listing_id = %listing.id, "listing created");
        Ok(listing)
    }

    async fn listings(&self) -> Result<Vec<Listing>> {
        Ok(self.snapshot()?.listings)
    }
}

impl UserStore for JsonStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(data.users.iter().find(|u| u.id == user_id).cloned())
    }

    #[instrument(skip_all, fields(user_id = %user_id, count = favorite_ids.len()))]
    async fn update_favorites(&self, user_id: &str, favorite_ids: Vec<String>) -> Result<User> {
        self.mutate(|data| {
            let user = data
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or_else(|| anyhow!("user {} not found", user_id))?;
            user.favorite_ids = favorite_ids;
            Ok(user.clone())
        })
    }
}
