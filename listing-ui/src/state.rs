//! Shared application state for the UI server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, bail};
use listing::core::types::NotificationKind;
use listing::io::config::{ListingConfig, load_config};
use listing::io::init::ListingPaths;
use listing::io::notify::{Notifier, RefreshSignal};
use listing::io::store::JsonStore;
use listing::wizard::{Wizard, WizardSettings};
use tokio::sync::broadcast;
use tracing::debug;

/// Events broadcast to SSE clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The listing index changed (created here or edited on disk).
    ListingsChanged,
    FavoritesChanged {
        user_id: String,
    },
    WizardChanged {
        user_id: String,
    },
    /// User-visible notification.
    Toast {
        user_id: String,
        kind: NotificationKind,
        message: String,
    },
}

impl ChangeEvent {
    /// User the event is addressed to; `None` for global events.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::ListingsChanged => None,
            Self::FavoritesChanged { user_id }
            | Self::WizardChanged { user_id }
            | Self::Toast { user_id, .. } => Some(user_id),
        }
    }
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub paths: ListingPaths,
    pub config: Arc<ListingConfig>,
    pub store: Arc<JsonStore>,
    /// One wizard instance per user id.
    pub wizards: Arc<Mutex<HashMap<String, Wizard>>>,
    /// Broadcast sender for SSE events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(paths: ListingPaths, config: ListingConfig, store: JsonStore) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            paths,
            config: Arc::new(config),
            store: Arc::new(store),
            wizards: Arc::new(Mutex::new(HashMap::new())),
            event_tx: Arc::new(event_tx),
        }
    }

    /// Load config and store from an initialized project directory.
    pub fn open(project_dir: &Path) -> Result<Self> {
        let paths = ListingPaths::new(project_dir);
        if !paths.listing_dir.is_dir() {
            bail!(
                "{} is not a listing project (run `listing init` first)",
                project_dir.display()
            );
        }
        let config = load_config(&paths.config_path)?;
        let store = JsonStore::open(paths.store_path(&config)).context("open store")?;
        Ok(Self::new(paths, config, store))
    }

    /// Path to the store file.
    pub fn store_path(&self) -> PathBuf {
        self.paths.store_path(&self.config)
    }

    pub fn wizard_settings(&self) -> WizardSettings {
        WizardSettings::from(self.config.as_ref())
    }

    pub fn lock_wizards(&self) -> Result<MutexGuard<'_, HashMap<String, Wizard>>> {
        self.wizards
            .lock()
            .map_err(|_| anyhow::anyhow!("wizard lock poisoned"))
    }

    pub fn broadcast(&self, event: ChangeEvent) {
        debug!(?event, "broadcasting");
        // No subscribers is not an error.
        let _ = self.event_tx.send(event);
    }

    pub fn notifier_for(&self, user_id: &str) -> BroadcastNotifier {
        BroadcastNotifier {
            state: self.clone(),
            user_id: user_id.to_string(),
        }
    }

    pub fn refresh(&self) -> BroadcastRefresh {
        BroadcastRefresh {
            state: self.clone(),
        }
    }
}

/// Sends toasts to the SSE stream, addressed to one user.
pub struct BroadcastNotifier {
    state: AppState,
    user_id: String,
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.state.broadcast(ChangeEvent::Toast {
            user_id: self.user_id.clone(),
            kind,
            message: message.to_string(),
        });
    }
}

/// Tells SSE clients to re-fetch the listing index.
pub struct BroadcastRefresh {
    state: AppState,
}

impl RefreshSignal for BroadcastRefresh {
    fn request_refresh(&self) {
        self.state.broadcast(ChangeEvent::ListingsChanged);
    }
}
