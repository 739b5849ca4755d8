use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role used for every access decision.
///
/// The set is closed and totally ordered by privilege:
/// `Operator < Admin < SuperAdmin`. Comparisons go through [`Role::ordinal`];
/// the type deliberately does not implement `PartialOrd`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Admin,
    SuperAdmin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Operator, Role::Admin, Role::SuperAdmin];

    /// Privilege level; higher dominates lower.
    pub const fn ordinal(self) -> u8 {
        match self {
            Role::Operator => 1,
            Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    /// `true` iff this role is at least as privileged as `other`.
    pub const fn dominates(self, other: Role) -> bool {
        self.ordinal() >= other.ordinal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin_or_above(self) -> bool {
        self.dominates(Role::Admin)
    }

    pub fn is_super_admin(self) -> bool {
        self == Role::SuperAdmin
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
