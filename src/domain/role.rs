//! Account role hierarchy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// The three account tiers, ordered MASTER > ADMIN > USER.
///
/// Closed set: every match over `Role` is exhaustive, and parsing an
/// unknown string is an error at the boundary rather than a silent
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Master,
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "MASTER",
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// Check if this role is exactly MASTER
    pub fn is_master(&self) -> bool {
        matches!(self, Role::Master)
    }

    /// Check if this role is exactly ADMIN
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Check if this role carries administrative standing (ADMIN or MASTER)
    pub fn is_admin_or_above(&self) -> bool {
        match self {
            Role::Master | Role::Admin => true,
            Role::User => false,
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(Role::Master),
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(AppError::validation(format!("unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Master, Role::Admin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        assert!("master".parse::<Role>().is_err());
        assert!("SUPERADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_standing() {
        assert!(Role::Master.is_admin_or_above());
        assert!(Role::Admin.is_admin_or_above());
        assert!(!Role::User.is_admin_or_above());
    }
}
