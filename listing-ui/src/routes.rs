//! HTTP route handlers for the UI API.
//!
//! The current user is resolved from the `x-user-id` header. Wizard handlers
//! lock the per-user wizard map only for synchronous transitions; the lock is
//! released before the persistence call is awaited.

use axum::Router;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use listing::core::error::{FavoriteError, WizardError};
use listing::core::types::{FieldName, FieldValue, Listing, SubmissionResult, User};
use listing::favorites::{add_favorite, remove_favorite, resolve_current_user};
use listing::io::store::ListingStore;
use listing::submission;
use listing::wizard::{CounterDelta, StepSignal, Wizard, WizardView};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::state::{AppState, ChangeEvent};

pub const USER_HEADER: &str = "x-user-id";

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/listings", get(list_listings))
        .route(
            "/favorites/{listing_id}",
            post(post_favorite).delete(delete_favorite),
        )
        .route(
            "/wizard",
            post(open_wizard).get(get_wizard).delete(close_wizard),
        )
        .route("/wizard/fields/{name}", put(set_field))
        .route("/wizard/counters/{name}", post(adjust_counter))
        .route("/wizard/back", post(wizard_back))
        .route("/wizard/submit", post(wizard_submit))
}

/// Error body `{"error": message}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        warn!(error = %err, "rejected wizard request");
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(fav) = err.downcast_ref::<FavoriteError>() {
            let status = match fav {
                FavoriteError::Unauthenticated => StatusCode::UNAUTHORIZED,
                FavoriteError::InvalidListingId(_) => StatusCode::BAD_REQUEST,
            };
            return Self::new(status, fav.to_string());
        }
        if let Some(wizard) = err.downcast_ref::<WizardError>() {
            return Self::from(wizard.clone());
        }
        warn!(error = %format!("{:#}", err), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

/// Authenticated user resolved from the `x-user-id` header.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let user = resolve_current_user(state.store.as_ref(), user_header(&parts.headers)).await?;
        Ok(Self(user))
    }
}

fn user_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_HEADER).and_then(|v| v.to_str().ok())
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/listings - every persisted listing.
async fn list_listings(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.store.listings().await?))
}

/// POST /api/favorites/{listing_id}
async fn post_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = add_favorite(state.store.as_ref(), user_header(&headers), &listing_id).await?;
    state.broadcast(ChangeEvent::FavoritesChanged {
        user_id: user.id.clone(),
    });
    Ok(Json(user))
}

/// DELETE /api/favorites/{listing_id}
async fn delete_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = remove_favorite(state.store.as_ref(), user_header(&headers), &listing_id).await?;
    state.broadcast(ChangeEvent::FavoritesChanged {
        user_id: user.id.clone(),
    });
    Ok(Json(user))
}

/// POST /api/wizard - open a fresh wizard, replacing any previous one.
async fn open_wizard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WizardView>, ApiError> {
    let view = {
        let mut wizards = state.lock_wizards()?;
        let wizard = Wizard::open(state.wizard_settings());
        let view = wizard.view();
        wizards.insert(user.id.clone(), wizard);
        view
    };
    info!(user_id = %user.id, "wizard opened");
    state.broadcast(ChangeEvent::WizardChanged { user_id: user.id });
    Ok(Json(view))
}

/// GET /api/wizard - current view, including a closed wizard after success.
async fn get_wizard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WizardView>, ApiError> {
    let wizards = state.lock_wizards()?;
    let wizard = wizards
        .get(&user.id)
        .ok_or_else(|| ApiError::not_found("no wizard"))?;
    Ok(Json(wizard.view()))
}

/// DELETE /api/wizard - close and discard the wizard.
async fn close_wizard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let removed = state.lock_wizards()?.remove(&user.id);
    let Some(mut wizard) = removed else {
        return Err(ApiError::not_found("no wizard"));
    };
    wizard.close();
    state.broadcast(ChangeEvent::WizardChanged { user_id: user.id });
    Ok(StatusCode::NO_CONTENT)
}

/// Run `f` on the user's open wizard and broadcast the change.
fn with_open_wizard<T>(
    state: &AppState,
    user_id: &str,
    f: impl FnOnce(&mut Wizard) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let out = {
        let mut wizards = state.lock_wizards()?;
        let wizard = wizards
            .get_mut(user_id)
            .filter(|w| w.is_open())
            .ok_or_else(|| ApiError::not_found("no open wizard"))?;
        f(wizard)?
    };
    state.broadcast(ChangeEvent::WizardChanged {
        user_id: user_id.to_string(),
    });
    Ok(out)
}

/// PUT /api/wizard/fields/{name} - body is the JSON field value.
async fn set_field(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Json(value): Json<FieldValue>,
) -> Result<Json<WizardView>, ApiError> {
    let view = with_open_wizard(&state, &user.id, |wizard| {
        match wizard.set_field_by_key(&name, value)? {
            Some(_) => Ok(wizard.view()),
            None => Err(ApiError::conflict("submission in progress")),
        }
    })?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct CounterRequest {
    delta: CounterDelta,
}

/// POST /api/wizard/counters/{name} - `{"delta": "increment" | "decrement"}`.
async fn adjust_counter(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Json(request): Json<CounterRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let name: FieldName = name.parse()?;
    let view = with_open_wizard(&state, &user.id, |wizard| {
        match wizard.adjust_counter(name, request.delta)? {
            Some(_) => Ok(wizard.view()),
            None => Err(ApiError::conflict("submission in progress")),
        }
    })?;
    Ok(Json(view))
}

/// POST /api/wizard/back
async fn wizard_back(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WizardView>, ApiError> {
    let view = with_open_wizard(&state, &user.id, |wizard| {
        if wizard.is_submitting() {
            return Err(ApiError::conflict("submission in progress"));
        }
        wizard.on_back();
        Ok(wizard.view())
    })?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum SubmitResponse {
    Advanced {
        view: WizardView,
    },
    Blocked {
        fields: Vec<FieldName>,
        view: WizardView,
    },
    Created {
        listing: Listing,
        view: Option<WizardView>,
    },
    Failed {
        view: Option<WizardView>,
    },
}

/// POST /api/wizard/submit - the "submit step" signal.
///
/// Advances on intermediate steps. On the terminal step it runs the single
/// persistence call; a request while one is outstanding gets `409`.
async fn wizard_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubmitResponse>, ApiError> {
    let (signal, view) = {
        let mut wizards = state.lock_wizards()?;
        let wizard = wizards
            .get_mut(&user.id)
            .filter(|w| w.is_open())
            .ok_or_else(|| ApiError::not_found("no open wizard"))?;
        let signal = wizard.submit_step();
        (signal, wizard.view())
    };
    // A dropped duplicate changed nothing and is not broadcast.
    let wizard_changed = || {
        state.broadcast(ChangeEvent::WizardChanged {
            user_id: user.id.clone(),
        });
    };
    let pending = match signal {
        StepSignal::Busy => return Err(ApiError::conflict("submission in progress")),
        StepSignal::Advanced(_) => {
            wizard_changed();
            return Ok(Json(SubmitResponse::Advanced { view }));
        }
        StepSignal::Blocked(fields) => {
            wizard_changed();
            return Ok(Json(SubmitResponse::Blocked { fields, view }));
        }
        StepSignal::Submit(pending) => {
            wizard_changed();
            pending
        }
    };

    let completed = submission::perform(state.store.as_ref(), &user.id, pending).await;
    let notifier = state.notifier_for(&user.id);
    let refresh = state.refresh();
    let (result, view) = {
        let mut wizards = state.lock_wizards()?;
        match wizards.get_mut(&user.id) {
            Some(wizard) => {
                let result = wizard.finish_submission(completed, &notifier, &refresh);
                (result, Some(wizard.view()))
            }
            None => {
                submission::announce(
                    completed.result(),
                    &state.config.messages,
                    &notifier,
                    &refresh,
                );
                (completed.release(), None)
            }
        }
    };
    state.broadcast(ChangeEvent::WizardChanged {
        user_id: user.id.clone(),
    });

    Ok(Json(match result {
        SubmissionResult::Success(listing) => SubmitResponse::Created { listing, view },
        SubmissionResult::Failure(_) => SubmitResponse::Failed { view },
    }))
}
