use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Roles issued by the identity provider.
///
/// Only `Admin` carries extra privileges here; guests, sellers and
/// technicians are treated like plain users by the fulfillment flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    User,
    Seller,
    Technician,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Seller => "seller",
            Role::Technician => "technician",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "seller" => Ok(Role::Seller),
            "technician" => Ok(Role::Technician),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::IdentityError(format!("unknown role: {}", other))),
        }
    }
}

/// The authenticated caller. Passed explicitly into every operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self::new(user_id, Role::User)
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Build an identity from raw token claims.
    pub fn from_claims(sub: &str, role: &str) -> Result<Self, CoreError> {
        let user_id = Uuid::parse_str(sub)
            .map_err(|e| CoreError::IdentityError(format!("invalid subject {}: {}", sub, e)))?;
        Ok(Self::new(user_id, role.parse()?))
    }
}
