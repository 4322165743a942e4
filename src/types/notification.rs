//! Deferred Credential and Notification endpoint types.

use serde::{Deserialize, Serialize};

/// Request to the Deferred Credential Endpoint, redeeming a transaction id
/// from an earlier Credential Response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeferredCredentialRequest {
    /// Identifies a deferred issuance transaction.
    pub transaction_id: String,
}

/// Request to the Notification Endpoint, telling the issuer what became of
/// an issued credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NotificationRequest {
    /// The `notification_id` received in the Credential Response.
    pub notification_id: String,

    /// The event that occurred.
    pub event: NotificationEvent,

    /// Human-readable detail about the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
}

impl NotificationRequest {
    /// The credential was successfully stored in the Wallet.
    #[must_use]
    pub fn accepted(notification_id: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            event: NotificationEvent::CredentialAccepted,
            event_description: None,
        }
    }

    /// Credential storage failed, or the End-User rejected the credential.
    #[must_use]
    pub fn failure(
        notification_id: impl Into<String>, description: Option<String>,
    ) -> Self {
        Self {
            notification_id: notification_id.into(),
            event: NotificationEvent::CredentialFailure,
            event_description: description,
        }
    }

    /// The credential was deleted from the Wallet.
    #[must_use]
    pub fn deleted(notification_id: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            event: NotificationEvent::CredentialDeleted,
            event_description: None,
        }
    }
}

/// Events the Wallet can notify the issuer of.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// The credential was successfully stored in the Wallet.
    CredentialAccepted,

    /// Storage failed or the End-User rejected the credential.
    CredentialFailure,

    /// The credential was deleted from the Wallet.
    CredentialDeleted,
}
