//! Signature algorithm for push queue callbacks.
//!
//! Every task handed to the push queue carries a signature over its body so
//! that the consume endpoint can reject callbacks that did not originate from
//! this backend. The wire format for the header is:
//!
//! ```text
//! Superbutton-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! where the signature is `HMAC-SHA256("{timestamp}.{body}", secret)`.
//!
//! Queued tasks may be redelivered long after they were signed, so unlike a
//! request signature there is no freshness window.

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Superbutton-Signature";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn signed_data(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut data = format!("{timestamp}.").into_bytes();
    data.extend_from_slice(body);
    data
}

/// Sign a task body, returning the full header value.
pub fn sign_body(body: &[u8], key: &[u8]) -> String {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    let signature = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        &signed_data(timestamp, body),
    );
    format_signature_header(timestamp, signature.as_ref())
}

/// Verify a `Superbutton-Signature` header value against the raw body.
pub fn verify_body(header_value: &str, body: &[u8], key: &[u8]) -> Result<(), SignatureError> {
    let (timestamp, signature) = parse_signature_header(header_value)?;
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        &signed_data(timestamp, body),
        signature.as_ref(),
    )?;
    Ok(())
}

/// Parse a header value (`{timestamp}.{base64}`) into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, signature) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}
