//! Shared wire types for the Superbutton backend.
//!
//! Everything in here is transport-level: the CloudEvents-shaped
//! [`objects::event::Envelope`], API DTOs, and the HMAC signature used to
//! authenticate push queue callbacks.

#![forbid(unsafe_code)]

pub mod objects;
pub mod signature;
