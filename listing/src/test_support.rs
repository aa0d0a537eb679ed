//! Test-only helpers: scripted persistence, recording sinks, temp projects.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

use crate::core::types::{
    CountrySelection, FieldName, FieldValue, Listing, ListingDraft, NotificationKind, User,
};
use crate::io::config::ListingConfig;
use crate::io::init::{InitOptions, ListingPaths, init_project};
use crate::io::notify::{Notifier, RefreshSignal};
use crate::io::store::{JsonStore, ListingStore};
use crate::wizard::{StepSignal, Wizard, WizardSettings};

/// Deterministic complete draft.
pub fn draft() -> ListingDraft {
    ListingDraft {
        category: "Beach".to_string(),
        location: Some(netherlands()),
        guest_count: 4,
        room_count: 2,
        bathroom_count: 1,
        image_src: "https://images.example/cabin.png".to_string(),
        price: 100,
        title: "Cabin".to_string(),
        description: "Quiet cabin by the dunes".to_string(),
    }
}

pub fn netherlands() -> CountrySelection {
    CountrySelection {
        value: "NL".to_string(),
        label: "Netherlands".to_string(),
        flag: "NL".to_string(),
        latlng: (52.5, 5.75),
        region: "Europe".to_string(),
    }
}

/// Wizard on the Price step with every field set to the values of [`draft`].
pub fn filled_wizard(settings: WizardSettings) -> Wizard {
    let d = draft();
    let mut wizard = Wizard::open(settings);
    let values = [
        (FieldName::Category, FieldValue::text(d.category)),
        (FieldName::Location, FieldValue::Location(d.location)),
        (FieldName::GuestCount, FieldValue::Number(d.guest_count)),
        (FieldName::RoomCount, FieldValue::Number(d.room_count)),
        (FieldName::BathroomCount, FieldValue::Number(d.bathroom_count)),
        (FieldName::ImageSrc, FieldValue::text(d.image_src)),
        (FieldName::Price, FieldValue::Number(d.price)),
        (FieldName::Title, FieldValue::text(d.title)),
        (FieldName::Description, FieldValue::text(d.description)),
    ];
    for (name, value) in values {
        wizard.set_field(name, value).expect("catalog value");
    }
    while !wizard.current_step().is_terminal() {
        assert!(matches!(wizard.submit_step(), StepSignal::Advanced(_)));
    }
    wizard
}

/// Listing store that returns scripted outcomes and counts calls.
///
/// Queued outcomes are consumed first; afterwards every call gets the default.
/// A gated store holds each call until [`release`](Self::release) is called.
#[derive(Debug)]
pub struct ScriptedStore {
    default: Result<(), String>,
    queued: Mutex<VecDeque<Result<(), String>>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
    started: Notify,
}

impl ScriptedStore {
    fn with_default(default: Result<(), String>) -> Self {
        Self {
            default,
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            started: Notify::new(),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_default(Ok(()))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_default(Err(reason.to_string()))
    }

    /// Hold every call until released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Queue a one-off outcome ahead of the default.
    pub fn then(self, outcome: Result<(), &str>) -> Self {
        self.queued
            .lock()
            .expect("queue lock")
            .push_back(outcome.map_err(str::to_string));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Resolves once a call has entered the store.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let `n` held calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    fn next_outcome(&self) -> Result<(), String> {
        self.queued
            .lock()
            .expect("queue lock")
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl ListingStore for ScriptedStore {
    async fn create_listing(&self, owner_id: &str, draft: ListingDraft) -> Result<Listing> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|_| anyhow!("gate closed"))?;
            permit.forget();
        }
        self.next_outcome().map_err(|reason| anyhow!(reason))?;
        Ok(Listing {
            id: format!("listing-{}", n),
            user_id: owner_id.to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            draft,
        })
    }

    async fn listings(&self) -> Result<Vec<Listing>> {
        Ok(Vec::new())
    }
}

/// Notifier that records every toast.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(NotificationKind, String)> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events().into_iter().map(|(kind, _)| kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push((kind, message.to_string()));
    }
}

/// Refresh signal that counts requests.
#[derive(Debug, Default)]
pub struct RecordingRefresh {
    count: AtomicUsize,
}

impl RecordingRefresh {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RefreshSignal for RecordingRefresh {
    fn request_refresh(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Initialized `.listing/` project in a temp directory with one user.
pub struct TestProject {
    _temp: TempDir,
    pub paths: ListingPaths,
    pub config: ListingConfig,
    pub user: User,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_project(temp.path(), &InitOptions { force: false }).expect("init");
        let config = ListingConfig::default();
        let store = JsonStore::open(paths.store_path(&config)).expect("open store");
        let user = store
            .add_user("Test User", "test@example.com")
            .expect("add user");
        Self {
            _temp: temp,
            paths,
            config,
            user,
        }
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    pub fn store(&self) -> JsonStore {
        JsonStore::open(self.paths.store_path(&self.config)).expect("open store")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
