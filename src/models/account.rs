use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access role carried by an account and embedded in its tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account; may only act on tasks it owns.
    #[default]
    User,
    /// Administrator; may act on every task and set any status.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Maps a client-supplied role name to a role. Only `admin` (any case)
    /// selects `Admin`; everything else, including garbage, is `User`.
    pub fn from_requested(requested: Option<&str>) -> Self {
        match requested {
            Some(name) if name.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A registered account as held by the account directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    /// Lower-cased, unique across the directory.
    pub email: String,
    pub name: String,
    pub password_digest: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password_digest: String,
    pub role: Role,
}

/// Public projection of an account returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Lower-case role name, e.g. `"user"`.
    pub role: String,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role.as_str().to_lowercase(),
        }
    }
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_role_mapping() {
        assert_eq!(Role::from_requested(Some("admin")), Role::Admin);
        assert_eq!(Role::from_requested(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::from_requested(Some("superuser")), Role::User);
        assert_eq!(Role::from_requested(None), Role::User);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_account_view_lowercases_role() {
        let account = Account {
            id: "a1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_digest: "x".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let view = AccountView::from(&account);
        assert_eq!(view.role, "admin");
        assert_eq!(view.email, "ada@example.com");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
