//! User Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role, fixed for the lifetime of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Farmer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Farmer => "farmer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated account as returned by `/auth/*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Farmer).unwrap(), "\"farmer\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"Farmer\"").is_err());
    }

    #[test]
    fn test_user_decode_ignores_unknown_fields() {
        let json = r#"{
            "id": "u1",
            "email": "b@x.io",
            "name": "Bea",
            "phone": "555",
            "role": "buyer",
            "password_hash": "ignored",
            "created_at": "2024-05-01T10:20:30.123456"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.is(Role::Buyer));
        assert!(user.address.is_none());
        assert!(user.created_at.is_some());
    }
}
