//! Server-Sent Events stream and store file watcher.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use listing::core::types::NotificationKind;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<NotificationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        let user_id = event.user_id().map(str::to_string);
        match event {
            ChangeEvent::ListingsChanged => SsePayload {
                event_type: "listings_changed",
                user_id,
                kind: None,
                message: None,
            },
            ChangeEvent::FavoritesChanged { .. } => SsePayload {
                event_type: "favorites_changed",
                user_id,
                kind: None,
                message: None,
            },
            ChangeEvent::WizardChanged { .. } => SsePayload {
                event_type: "wizard_changed",
                user_id,
                kind: None,
                message: None,
            },
            ChangeEvent::Toast { kind, message, .. } => SsePayload {
                event_type: "toast",
                user_id,
                kind: Some(*kind),
                message: Some(message.clone()),
            },
        }
    }
}

/// SSE event name: toasts are `toast`, everything else `change`.
fn event_name(event: &ChangeEvent) -> &'static str {
    match event {
        ChangeEvent::Toast { .. } => "toast",
        _ => "change",
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Only deliver user-addressed events for this user.
    user: Option<String>,
}

/// True if `event` should reach a client subscribed with `filter`.
fn delivers_to(event: &ChangeEvent, filter: Option<&str>) -> bool {
    match (event.user_id(), filter) {
        (Some(target), Some(user)) => target == user,
        _ => true,
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    if !delivers_to(&change_event, query.user.as_deref()) {
                        continue;
                    }
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event(event_name(&change_event)).data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the store watcher in a background task.
pub fn start_file_watcher(state: AppState) {
    tokio::spawn(async move {
        if let Err(e) = run_file_watcher(state).await {
            warn!(error = %e, "file watcher failed");
        }
    });
}

async fn run_file_watcher(state: AppState) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(250)),
    )?;

    let listing_dir = state.paths.listing_dir.clone();
    watcher.watch(&listing_dir, RecursiveMode::NonRecursive)?;
    info!(path = %listing_dir.display(), "watching listing directory");

    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(250));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                process_events(&state, &pending_events);
                pending_events.clear();
            }
        }
    }
}

/// Reload the store when its file changed on disk and announce new data.
///
/// Writes made by this server leave the in-memory copy equal to the file, so
/// only out-of-band edits produce a `listings_changed` event.
fn process_events(state: &AppState, events: &[NotifyEvent]) {
    let store_path = state.store_path();
    let touched = events.iter().any(|event| {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event.paths.iter().any(|p| p == &store_path)
    });
    if !touched {
        return;
    }

    match state.store.reload() {
        Ok(true) => {
            debug!(path = %store_path.display(), "store changed on disk");
            state.broadcast(ChangeEvent::ListingsChanged);
        }
        Ok(false) => {}
        Err(err) => warn!(error = %format!("{:#}", err), "store reload failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing::io::store::{StoreData, write_store};
    use listing::test_support::TestProject;

    fn modify_event(path: std::path::PathBuf) -> NotifyEvent {
        NotifyEvent {
            kind: EventKind::Modify(notify::event::ModifyKind::Any),
            paths: vec![path],
            attrs: Default::default(),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[test]
    fn out_of_band_store_edit_emits_listings_changed() {
        let project = TestProject::new();
        let state = AppState::open(project.root()).expect("state");
        let mut rx = state.event_tx.subscribe();
        let store_path = state.store_path();

        process_events(&state, &[modify_event(store_path.clone())]);
        assert!(drain(&mut rx).is_empty());

        write_store(&store_path, &StoreData::default()).expect("write");
        process_events(&state, &[modify_event(store_path)]);
        assert_eq!(drain(&mut rx), vec![ChangeEvent::ListingsChanged]);
        assert!(state.store.snapshot().expect("snapshot").users.is_empty());
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let project = TestProject::new();
        let state = AppState::open(project.root()).expect("state");
        let mut rx = state.event_tx.subscribe();

        write_store(&state.store_path(), &StoreData::default()).expect("write");
        process_events(&state, &[modify_event(state.paths.config_path.clone())]);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn toast_payload_carries_kind_and_message() {
        let event = ChangeEvent::Toast {
            user_id: "u1".to_string(),
            kind: NotificationKind::Failure,
            message: "Something went wrong".to_string(),
        };
        let json = serde_json::to_value(SsePayload::from(&event)).expect("json");
        assert_eq!(json["type"], "toast");
        assert_eq!(json["kind"], "failure");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(event_name(&event), "toast");
        assert_eq!(event_name(&ChangeEvent::ListingsChanged), "change");
    }

    #[test]
    fn user_filter_keeps_global_events() {
        let wizard = ChangeEvent::WizardChanged {
            user_id: "u1".to_string(),
        };
        assert!(delivers_to(&wizard, Some("u1")));
        assert!(!delivers_to(&wizard, Some("u2")));
        assert!(delivers_to(&wizard, None));
        assert!(delivers_to(&ChangeEvent::ListingsChanged, Some("u2")));
    }
}
