//! Identity-provider event payloads
//!
//! Only the fields the mirror needs are declared; everything else in the
//! provider's payload is ignored.

use serde::Deserialize;

use crate::models::organization::{normalize_role, slugify};
use crate::models::{UpsertOrganization, UpsertUser};

/// Raw `{ "type": ..., "data": ... }` envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,

    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("No email found")]
    MissingEmail,

    #[error("No user id found")]
    MissingUserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `user.created` / `user.updated`
    UserUpserted(UserData),

    /// `organization.created` / `organization.updated`
    OrganizationUpserted(OrganizationData),

    /// `organizationMembership.created`
    MembershipCreated(MembershipData),

    /// `organizationMembership.deleted`
    MembershipDeleted(MembershipData),

    /// Any other type; accepted without effect
    Unhandled(String),
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, EventError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| EventError::Malformed(e.to_string()))?;

        let event = match envelope.event_type.as_str() {
            "user.created" | "user.updated" => WebhookEvent::UserUpserted(data(envelope.data)?),
            "organization.created" | "organization.updated" => {
                WebhookEvent::OrganizationUpserted(data(envelope.data)?)
            }
            "organizationMembership.created" => {
                WebhookEvent::MembershipCreated(data(envelope.data)?)
            }
            "organizationMembership.deleted" => {
                WebhookEvent::MembershipDeleted(data(envelope.data)?)
            }
            _ => WebhookEvent::Unhandled(envelope.event_type),
        };

        Ok(event)
    }

    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::UserUpserted(_) => "user",
            WebhookEvent::OrganizationUpserted(_) => "organization",
            WebhookEvent::MembershipCreated(_) => "membership.created",
            WebhookEvent::MembershipDeleted(_) => "membership.deleted",
            WebhookEvent::Unhandled(event_type) => event_type,
        }
    }
}

fn data<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, EventError> {
    serde_json::from_value(value).map_err(|e| EventError::Malformed(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub id: Option<String>,
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserData {
    pub id: String,

    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,

    #[serde(default)]
    pub primary_email_address_id: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserData {
    /// The address flagged primary, else the first listed
    pub fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref().and_then(|primary_id| {
            self.email_addresses
                .iter()
                .find(|address| address.id.as_deref() == Some(primary_id))
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.trim())
            .filter(|email| !email.is_empty())
    }

    pub fn into_upsert(self) -> Result<UpsertUser, EventError> {
        let email = self.primary_email().ok_or(EventError::MissingEmail)?.to_string();

        Ok(UpsertUser {
            id: self.id,
            email,
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            avatar_url: non_empty(self.image_url),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationData {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,
}

impl OrganizationData {
    pub fn into_upsert(self) -> UpsertOrganization {
        let slug = non_empty(self.slug).unwrap_or_else(|| slugify(&self.name));

        UpsertOrganization {
            external_org_id: self.id,
            name: self.name,
            slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicUserData {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MembershipData {
    pub organization: OrganizationRef,

    #[serde(default)]
    pub public_user_data: Option<PublicUserData>,

    #[serde(default)]
    pub role: Option<String>,
}

impl MembershipData {
    pub fn user_id(&self) -> Result<&str, EventError> {
        self.public_user_data
            .as_ref()
            .and_then(|data| data.user_id.as_deref())
            .filter(|id| !id.is_empty())
            .ok_or(EventError::MissingUserId)
    }

    /// Provider role without its `org:` namespace, `member` when absent
    pub fn role(&self) -> String {
        normalize_role(self.role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<WebhookEvent, EventError> {
        WebhookEvent::parse(value.to_string().as_bytes())
    }

    #[test]
    fn test_user_event_picks_primary_email() {
        let event = parse(json!({
            "type": "user.updated",
            "data": {
                "id": "user_1",
                "email_addresses": [
                    {"id": "idn_a", "email_address": "old@example.com"},
                    {"id": "idn_b", "email_address": "new@example.com"}
                ],
                "primary_email_address_id": "idn_b",
                "first_name": "",
                "last_name": "Lovelace"
            }
        }))
        .unwrap();

        let WebhookEvent::UserUpserted(data) = event else {
            panic!("expected user event");
        };
        let user = data.into_upsert().unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.first_name, None);
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
    }

    #[test]
    fn test_user_event_falls_back_to_first_email() {
        let data: UserData = serde_json::from_value(json!({
            "id": "user_1",
            "email_addresses": [{"email_address": "first@example.com"}],
            "primary_email_address_id": "idn_missing"
        }))
        .unwrap();

        assert_eq!(data.primary_email(), Some("first@example.com"));
    }

    #[test]
    fn test_user_without_email() {
        let data: UserData =
            serde_json::from_value(json!({"id": "user_1", "email_addresses": []})).unwrap();
        assert_eq!(data.into_upsert(), Err(EventError::MissingEmail));
    }

    #[test]
    fn test_organization_slug_derived_from_name() {
        let data: OrganizationData =
            serde_json::from_value(json!({"id": "org_42", "name": "Acme Rocket Works"})).unwrap();
        assert_eq!(data.into_upsert().slug, "acme-rocket-works");
    }

    #[test]
    fn test_membership_role_and_user() {
        let event = parse(json!({
            "type": "organizationMembership.created",
            "data": {
                "organization": {"id": "org_42"},
                "public_user_data": {"user_id": "u1"},
                "role": "org:admin"
            }
        }))
        .unwrap();

        let WebhookEvent::MembershipCreated(data) = event else {
            panic!("expected membership event");
        };
        assert_eq!(data.user_id(), Ok("u1"));
        assert_eq!(data.role(), "admin");
    }

    #[test]
    fn test_membership_without_user_id() {
        let data: MembershipData =
            serde_json::from_value(json!({"organization": {"id": "org_42"}})).unwrap();
        assert_eq!(data.user_id(), Err(EventError::MissingUserId));
        assert_eq!(data.role(), "member");
    }

    #[test]
    fn test_unhandled_type() {
        let event = parse(json!({"type": "session.created", "data": {"id": "sess_1"}})).unwrap();
        assert_eq!(event, WebhookEvent::Unhandled("session.created".to_string()));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            WebhookEvent::parse(b"not json"),
            Err(EventError::Malformed(_))
        ));
        assert!(matches!(
            parse(json!({"type": "organization.created", "data": {"id": "org_1"}})),
            Err(EventError::Malformed(_))
        ));
    }
}
