use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use super::repository::{EmailTransport, JobStore, NotificationLedger};
use super::service::RenewalScanService;

/// State behind the externally triggered scan endpoint: the service plus the
/// bearer token its caller must present.
pub struct RenewalTriggerState<S, L, T> {
    pub service: Arc<RenewalScanService<S, L, T>>,
    pub cron_secret: Option<String>,
}

impl<S, L, T> Clone for RenewalTriggerState<S, L, T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cron_secret: self.cron_secret.clone(),
        }
    }
}

/// Router builder exposing the scan trigger. The endpoint is meant to be hit
/// by an external scheduler (daily in practice); auth happens before any
/// scan, so rejected calls have no side effects.
pub fn renewal_router<S, L, T>(
    service: Arc<RenewalScanService<S, L, T>>,
    cron_secret: Option<String>,
) -> Router
where
    S: JobStore + 'static,
    L: NotificationLedger + 'static,
    T: EmailTransport + 'static,
{
    Router::new()
        .route("/api/v1/renewals/run", post(run_handler::<S, L, T>))
        .with_state(RenewalTriggerState {
            service,
            cron_secret,
        })
}

pub(crate) async fn run_handler<S, L, T>(
    State(state): State<RenewalTriggerState<S, L, T>>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    L: NotificationLedger + 'static,
    T: EmailTransport + 'static,
{
    if !authorized(state.cron_secret.as_deref(), &headers) {
        let payload = json!({ "error": "unauthorized" });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    }

    match state.service.run(Utc::now()) {
        Ok(summary) => {
            let payload = json!({
                "success": true,
                "notifications_sent": summary.notifications_sent,
                "errors": summary.errors.len(),
                "overview": summary.overview,
                "details": {
                    "sent": summary.sent,
                    "errors": summary.errors,
                },
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

/// An unconfigured secret rejects every invocation rather than opening the
/// trigger to the world.
fn authorized(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    value == format!("Bearer {expected}")
}
