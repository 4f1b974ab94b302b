//! Consume endpoint: the push queue delivers dispatched events here.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sbtn_sdk::objects::{Envelope, EnvelopeError};
use serde_json::json;

use crate::api::extractors::VerifiedBody;
use crate::state::AppState;

/// Errors that can occur in the events API.
#[derive(Debug)]
pub enum EventsApiError {
    /// The body is not an envelope.
    MalformedJson(serde_json::Error),
    /// The envelope failed validation.
    Invalid(EnvelopeError),
}

impl IntoResponse for EventsApiError {
    fn into_response(self) -> Response {
        match self {
            EventsApiError::MalformedJson(e) => {
                tracing::warn!(error = %e, "Cannot decode delivered event");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "The request body is not a valid event" })),
                )
                    .into_response()
            }
            EventsApiError::Invalid(e) => {
                tracing::warn!(error = %e, "Delivered event is invalid");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "message": "validation errors while consuming event",
                        "errors": { "event": e.violations() },
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// `POST /v1/events/consume`: publish a delivered event to its listeners.
///
/// Listener failures are logged by the dispatcher and never change the
/// response, so the queue does not redeliver because of them.
pub(super) async fn consume(
    State(state): State<AppState>,
    VerifiedBody(body): VerifiedBody,
) -> Result<StatusCode, EventsApiError> {
    let event: Envelope = serde_json::from_slice(&body).map_err(EventsApiError::MalformedJson)?;
    event.validate().map_err(EventsApiError::Invalid)?;

    state.dispatcher.publish(event).await;
    Ok(StatusCode::NO_CONTENT)
}
