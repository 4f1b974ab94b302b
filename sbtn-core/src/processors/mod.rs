//! Services that sit between the HTTP layer and the repositories.
//!
//! - `EventDispatcher`: validates, stores and enqueues events; fans delivered
//!   events out to listeners
//! - `ProjectSettingsService`: aggregates a project with its integrations
//! - `ProjectIntegrationService`: lists and reorders ordering records
//! - `MarketingListener`: adds new users to the marketing contact list

pub mod event_dispatcher;
pub mod marketing;
pub mod project_integrations;
pub mod project_settings;

pub use event_dispatcher::{DispatchError, EventDispatcher, EventListener, PublishSummary};
pub use marketing::{Contact, ContactList, MarketingListener, SendgridContactList};
pub use project_integrations::{ProjectIntegrationError, ProjectIntegrationService};
pub use project_settings::{ProjectSettings, ProjectSettingsService, SettingsError};
