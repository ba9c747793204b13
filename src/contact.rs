//! Contact messages: a public drop box read back by admins.

use crate::auth::AdminIdentity;
use crate::error::{ApiError, ApiResult};
use crate::model::{ContactMessage, ContactMessageCreate, ContactMessageId};
use crate::store::Store;
use chrono::Utc;
use tracing::info;

pub fn create_contact_message(
    store: &Store,
    payload: ContactMessageCreate,
) -> ApiResult<ContactMessage> {
    let mut missing = Vec::new();
    if payload.name.trim().is_empty() {
        missing.push("name");
    }
    if payload.email.trim().is_empty() {
        missing.push("email");
    }
    if payload.message.trim().is_empty() {
        missing.push("message");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let message = ContactMessage {
        id: ContactMessageId::generate(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone,
        message: payload.message.trim().to_string(),
        created_at: Utc::now(),
    };

    let created = message.clone();
    store.mutate(move |s| {
        s.insert_contact_message(message);
        Ok(())
    })?;
    info!(message = %created.id, "contact message received");
    Ok(created)
}

/// All messages, newest first.
pub fn list_contact_messages(store: &Store, _admin: &AdminIdentity) -> Vec<ContactMessage> {
    store.read(|s| s.contact_messages.values().rev().cloned().collect())
}
