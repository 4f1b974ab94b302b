//! Lifecycle event catalog.
//!
//! Every event travels inside a `sbtn_sdk::objects::Envelope` whose `type`
//! is one of the constants below and whose `data` is the matching payload.
//!
//! # Producers and consumers
//!
//! 1. A service builds an envelope and calls `EventDispatcher::dispatch`
//! 2. The push queue delivers it to `POST /v1/events/consume`
//! 3. `EventDispatcher::publish` fans it out to the subscribed listeners
//!
//! Inside this crate, `ProjectIntegrationService` produces `integration.updated`
//! when a reorder moves an integration, and `MarketingListener` consumes
//! `user.created`. The remaining builders and payloads are the producer API
//! for the services that create, update and delete users, projects and
//! integration records; they link this crate and dispatch through the same
//! `EventDispatcher`.

pub mod integration;
pub mod types;

pub use integration::{integration_created, integration_deleted, integration_updated};
pub use types::{
    INTEGRATION_CREATED, INTEGRATION_DELETED, INTEGRATION_UPDATED, IntegrationCreatedPayload,
    IntegrationDeletedPayload, IntegrationUpdatedPayload, PROJECT_CREATED, PROJECT_DELETED,
    PROJECT_UPDATED, ProjectCreatedPayload, ProjectDeletedPayload, ProjectUpdatedPayload,
    USER_CREATED, USER_UPDATED, UserCreatedPayload, UserUpdatedPayload,
};
