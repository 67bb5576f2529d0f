//! Marketplace roles.
//!
//! [`UserRole`] is a closed set. Dashboard dispatch matches on it
//! exhaustively, so adding a role is a compile-time-checked change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of a marketplace principal.
///
/// Ordered by privilege: `User < Operator < Manager < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Customer submitting service requests.
    User,
    /// Equipment operator; may also submit requests of their own.
    Operator,
    /// Back-office manager with marketplace-wide visibility.
    Manager,
    /// Administrator; manager visibility plus the user roster.
    Admin,
}

impl UserRole {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 4] = [Self::User, Self::Operator, Self::Manager, Self::Admin];

    /// Canonical wire representation (`"USER"`, `"OPERATOR"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Operator => "OPERATOR",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }

    /// Returns `true` if this role is at or above `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized user role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    /// Parses the canonical uppercase form. Surrounding whitespace is
    /// ignored; case is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "USER" => Ok(Self::User),
            "OPERATOR" => Ok(Self::Operator),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names() {
        for role in UserRole::ALL {
            let Ok(parsed) = role.as_str().parse::<UserRole>() else {
                panic!("{role} should parse");
            };
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn rejects_unknown_and_lowercase() {
        assert!("SUPERUSER".parse::<UserRole>().is_err());
        assert!("admin".parse::<UserRole>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn privilege_ordering() {
        assert!(UserRole::Admin.satisfies(UserRole::Manager));
        assert!(UserRole::Manager.satisfies(UserRole::Manager));
        assert!(!UserRole::Operator.satisfies(UserRole::Manager));
        assert!(UserRole::User < UserRole::Operator);
    }

    #[test]
    fn serde_uses_uppercase() {
        let json = serde_json::to_string(&UserRole::Operator).ok();
        assert_eq!(json.as_deref(), Some("\"OPERATOR\""));
    }
}
