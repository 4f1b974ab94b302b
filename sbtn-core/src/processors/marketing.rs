//! MarketingListener.
//!
//! Adds every newly created user to the marketing contact list. The list
//! provider is behind [`ContactList`]; [`SendgridContactList`] talks to the
//! SendGrid Marketing Contacts API.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sbtn_sdk::objects::Envelope;
use serde::Serialize;
use tracing::info;

use crate::events::{USER_CREATED, UserCreatedPayload};
use crate::processors::event_dispatcher::EventListener;

const SENDGRID_CONTACTS_URL: &str = "https://api.sendgrid.com/v3/marketing/contacts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Contact {
    /// Split a display name on its last space: everything before is the first
    /// name, the final word is the last name.
    pub fn from_display_name(name: Option<&str>, email: impl Into<String>) -> Self {
        let name = name.map(str::trim).unwrap_or_default();
        let (first_name, last_name) = match name.rsplit_once(' ') {
            Some((first, last)) => (first.trim_end(), last),
            None => (name, ""),
        };
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.into(),
        }
    }
}

/// A marketing audience that contacts can be added to.
#[async_trait]
pub trait ContactList: Send + Sync {
    /// Add or update a contact. Returns the provider's job reference.
    async fn add_contact(&self, contact: Contact) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct SendgridContactRequest<'a> {
    list_ids: [&'a str; 1],
    contacts: [Contact; 1],
}

pub struct SendgridContactList {
    http_client: reqwest::Client,
    api_key: String,
    list_id: String,
}

impl SendgridContactList {
    pub fn new(api_key: impl Into<String>, list_id: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_key: api_key.into(),
            list_id: list_id.into(),
        }
    }
}

#[async_trait]
impl ContactList for SendgridContactList {
    async fn add_contact(&self, contact: Contact) -> anyhow::Result<String> {
        let response = self
            .http_client
            .put(SENDGRID_CONTACTS_URL)
            .bearer_auth(&self.api_key)
            .json(&SendgridContactRequest {
                list_ids: [self.list_id.as_str()],
                contacts: [contact],
            })
            .send()
            .await
            .context("cannot reach sendgrid")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!(
                "sendgrid rejected contact for list [{}] with status {status}: {body}",
                self.list_id
            );
        }
        Ok(body)
    }
}

pub struct MarketingListener {
    contacts: Arc<dyn ContactList>,
}

impl MarketingListener {
    pub fn new(contacts: Arc<dyn ContactList>) -> Self {
        Self { contacts }
    }

    /// Event types this listener handles, ready for `EventDispatcher::subscribe_all`.
    pub fn subscriptions(self: Arc<Self>) -> Vec<(&'static str, Arc<dyn EventListener>)> {
        vec![(USER_CREATED, self as Arc<dyn EventListener>)]
    }
}

#[async_trait]
impl EventListener for MarketingListener {
    fn name(&self) -> &str {
        "marketing"
    }

    async fn handle(&self, event: &Envelope) -> anyhow::Result<()> {
        let payload: UserCreatedPayload = event
            .data_as()
            .with_context(|| format!("cannot decode event [{}] as user.created", event.id))?;

        let contact = Contact::from_display_name(payload.name.as_deref(), payload.email);
        let job = self.contacts.add_contact(contact).await.with_context(|| {
            format!(
                "cannot add user [{}] to contact list for event [{}]",
                payload.id, event.id
            )
        })?;

        info!(user_id = %payload.id, job = %job, "User added to contact list");
        Ok(())
    }
}
