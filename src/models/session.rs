use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};

/// The authenticated principal carried inside a session token.
///
/// Serialized as `{userId, role, email, name, expiresAt}`. `email` and
/// `display_name` are informational; authorization keys off `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Stable identifier of the principal. Never empty.
    pub user_id: String,
    /// Falls back to [`Role::User`] when the claim is absent.
    #[serde(default)]
    pub role: Role,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// The payload is invalid at or after this instant.
    pub expires_at: DateTime<Utc>,
}

impl SessionPayload {
    /// Builds the payload for a freshly authenticated user.
    pub fn for_user(user: &User, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id.to_string(),
            role: user.role,
            email: user.email.clone(),
            display_name: user.full_name.clone(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The outcome of verifying a session token.
///
/// There is no partially trusted state: either every check passed or the
/// token is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Verified {
    Valid(SessionPayload),
    Invalid,
}

impl Verified {
    pub fn into_payload(self) -> Option<SessionPayload> {
        match self {
            Verified::Valid(payload) => Some(payload),
            Verified::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verified::Valid(_))
    }
}

/// The session state of one request, computed once and stored in the
/// request extensions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionContext {
    Authenticated(SessionPayload),
    Anonymous,
}

impl SessionContext {
    pub fn payload(&self) -> Option<&SessionPayload> {
        match self {
            SessionContext::Authenticated(payload) => Some(payload),
            SessionContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionContext::Authenticated(_))
    }
}

impl From<Option<SessionPayload>> for SessionContext {
    fn from(payload: Option<SessionPayload>) -> Self {
        match payload {
            Some(payload) => SessionContext::Authenticated(payload),
            None => SessionContext::Anonymous,
        }
    }
}
