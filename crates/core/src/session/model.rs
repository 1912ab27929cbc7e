//! Identity model definitions

use serde::{Deserialize, Serialize};

use crate::serde_helpers::flexible_id;

/// The authenticated user as held by the client.
///
/// This is also the shape of the persisted session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(deserialize_with = "flexible_id::deserialize")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// User record as returned by signup/login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "flexible_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// `data` of a successful signup or login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthPayload {
    /// The session token may sit next to the user or inside it.
    pub fn into_identity(self) -> Identity {
        let AuthPayload { user, token } = self;
        Identity {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            token: token.or(user.token),
        }
    }
}
