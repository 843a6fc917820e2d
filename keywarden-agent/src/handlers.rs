//! Request handlers mapping the shell's message kinds onto the core flow.
//!
//! Every response is an envelope: `{"success": true, "data": …}` on
//! success, `{"success": false, "error": message}` on failure. The
//! non-error authentication outcomes (matched / no match / none enrolled)
//! are all success envelopes with distinct payloads.

use axum::extract::{Path, State};
use axum::Json;
use keywarden_core::MatchOutcome;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Success envelope around `data`.
fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Optional account-name overrides for a registration request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: Option<String>,
    pub user_display: Option<String>,
}

/// POST /register
///
/// Create a new credential against the authenticator and persist its
/// metadata. Returns the stored record.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let rp = state.rp_context(req.user_name, req.user_display);
    let record = state.flow.register_new_credential(&rp).await?;
    state.store.put(&record).await?;

    tracing::info!(credential_id = %record.id, "credential registered and stored");

    Ok(ok(json!({ "record": record })))
}

/// POST /authenticate
///
/// Request an assertion and reconcile it against the stored records.
/// "No match" and "none enrolled" are success envelopes, not errors.
pub async fn authenticate(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .flow
        .authenticate(&state.store, &state.config.rp_id)
        .await?;

    let data = match outcome {
        MatchOutcome::Matched(record) => json!({ "matched": true, "record": record }),
        MatchOutcome::NoMatch => json!({ "matched": false, "reason": "no_match" }),
        MatchOutcome::NoneEnrolled => json!({ "matched": false, "reason": "none_enrolled" }),
    };

    Ok(ok(data))
}

/// GET /credentials
///
/// Every stored credential record.
pub async fn list_credentials(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.store.get_all().await?;
    let count = records.len();

    Ok(ok(json!({ "credentials": records, "count": count })))
}

/// DELETE /credentials/{id}
///
/// Remove one record; reports whether it existed. Deleting a missing id
/// is not an error.
pub async fn delete_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let existed = state.store.delete_by_id(&id).await?;

    if existed {
        tracing::info!(credential_id = %id, "credential deleted");
    }

    Ok(ok(json!({ "deleted": existed })))
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
