//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `CallerId`: the authenticated user, taken from the `Superbutton-User-Id`
//!   header set by the upstream authentication layer.
//! - `VerifiedBody`: the raw request body, checked against the
//!   `Superbutton-Signature` header when a signing secret is configured
//!   (used by the consume endpoint).
//!
//! All cryptographic operations are delegated to [`sbtn_sdk::signature`].

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use sbtn_core::entities::UserId;
use sbtn_sdk::signature::{self, SIGNATURE_HEADER, SignatureError};

use crate::state::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "Superbutton-User-Id";

/// Maximum accepted event body size.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// CallerId: identity asserted by the auth layer
// ---------------------------------------------------------------------------

pub struct CallerId(pub UserId);

#[derive(Debug)]
pub struct MissingCallerId;

impl IntoResponse for MissingCallerId {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "missing Superbutton-User-Id header").into_response()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = MissingCallerId;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CallerId(UserId::new(value)))
            .ok_or(MissingCallerId)
    }
}

// ---------------------------------------------------------------------------
// VerifiedBody: push queue deliveries
// ---------------------------------------------------------------------------

/// Raw body of a push queue delivery.
///
/// # Header format
///
/// ```text
/// Superbutton-Signature: {unix_timestamp}.{base64_signature}
/// ```
///
/// The signature is computed as `HMAC-SHA256("{timestamp}.{body}", signing_secret)`.
/// Without a configured secret the body is accepted as is.
pub struct VerifiedBody(pub Bytes);

/// Errors that can occur during body verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifiedBodyError {
    #[error("missing Superbutton-Signature header")]
    MissingHeader,
    #[error("invalid Superbutton-Signature header format")]
    InvalidHeader,
    #[error("invalid signature encoding")]
    InvalidBase64,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("signature verification failed")]
    VerificationFailed,
}

impl From<SignatureError> for VerifiedBodyError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::SignatureMismatch => Self::VerificationFailed,
        }
    }
}

impl IntoResponse for VerifiedBodyError {
    fn into_response(self) -> Response {
        let status = match self {
            VerifiedBodyError::MissingHeader | VerifiedBodyError::VerificationFailed => {
                StatusCode::UNAUTHORIZED
            }
            VerifiedBodyError::InvalidHeader
            | VerifiedBodyError::InvalidBase64
            | VerifiedBodyError::BodyReadError => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

impl FromRequest<AppState> for VerifiedBody {
    type Rejection = VerifiedBodyError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = req
            .headers()
            .get(SIGNATURE_HEADER)
            .map(|value| value.to_str().map(str::to_owned))
            .transpose()
            .map_err(|_| VerifiedBodyError::InvalidHeader)?;

        let body = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| VerifiedBodyError::BodyReadError)?;

        if let Some(secret) = &state.signing_secret {
            let header_value = header_value.ok_or(VerifiedBodyError::MissingHeader)?;
            signature::verify_body(&header_value, &body, secret)?;
        }

        Ok(VerifiedBody(body))
    }
}
