use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CoreError, CoreResult, Entity, UserId};

/// Role of a warehouse user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
    Mechanic,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Mechanic => "mechanic",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            "mechanic" => Ok(Role::Mechanic),
            other => Err(CoreError::validation(format!(
                "unknown role '{other}' (expected admin, operator or mechanic)"
            ))),
        }
    }
}

/// A user acting on the warehouse. The core only uses users as actor references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Opaque hash produced by the authentication collaborator.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> &UserId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn create(id: UserId, new: NewUser, now: DateTime<Utc>) -> CoreResult<Self> {
        let username = new.username.trim();
        if username.is_empty() {
            return Err(CoreError::validation("username cannot be empty"));
        }
        Ok(Self {
            id,
            username: username.to_string(),
            email: new.email.trim().to_string(),
            password_hash: new.password_hash,
            role: new.role,
            created_at: now,
            updated_at: now,
        })
    }
}
