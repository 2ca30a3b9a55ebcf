//! HTTP surface: one method-routed `/` endpoint plus a liveness probe.
//!
//! - `GET /` answers the subscription handshake.
//! - `POST /` dispatches a delivery and always answers once all replies
//!   have been attempted.
//! - `GET /health` returns `OK`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use log::{error, info, warn};
use tower_http::catch_panic::CatchPanicLayer;

use crate::dispatch::{DispatchError, dispatch_body};
use crate::send_message::ReplySender;
use crate::verify::{VerifyError, verify};

const MSG_PROCESSED: &str = "Message processed";
const MSG_BAD_REQUEST: &str = "Bad request";
const MSG_INTERNAL_ERROR: &str = "Internal Server Error";

/// State shared by all handlers. Holds no mutable data.
pub struct AppState<S> {
    pub verify_token: String,
    pub sender: S,
}

impl<S: ReplySender> AppState<S> {
    pub fn new(verify_token: impl Into<String>, sender: S) -> Self {
        AppState {
            verify_token: verify_token.into(),
            sender,
        }
    }
}

pub fn router<S: ReplySender + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(verification_handler::<S>).post(delivery_handler::<S>))
        .route("/health", get(|| async { "OK" }))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(Arc::new(state))
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked while processing a request");
    (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL_ERROR).into_response()
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        if self.is_bad_request() {
            (StatusCode::BAD_REQUEST, MSG_BAD_REQUEST).into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL_ERROR).into_response()
        }
    }
}

async fn verification_handler<S: ReplySender>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, VerifyError> {
    let result = verify(
        params.get("hub.verify_token").map(String::as_str),
        params.get("hub.challenge").map(String::as_str),
        &state.verify_token,
    );

    match &result {
        Ok(_) => info!("Webhook verification succeeded"),
        Err(e) => warn!("Webhook verification rejected: {}", e),
    }

    result
}

async fn delivery_handler<S: ReplySender>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), DispatchError> {
    match dispatch_body(&state.sender, &body).await {
        Ok(outcome) => {
            info!(
                "Delivery processed: {} replied, {} skipped, {} failed",
                outcome.replied, outcome.skipped, outcome.failed_sends
            );
            Ok((StatusCode::OK, MSG_PROCESSED))
        }
        Err(e) => {
            if e.is_bad_request() {
                warn!("Rejected delivery: {}", e);
            } else {
                error!("Error processing message: {}", e);
            }
            Err(e)
        }
    }
}
