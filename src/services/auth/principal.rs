/*
 * Responsibility
 * - The principal handed to the core by the credential store (identity + role + authorities + flags)
 * - Role → authority mapping
 */
use serde::Serialize;
use std::{fmt, str::FromStr};

pub const USER_READ: &str = "user:read";
pub const USER_CREATE: &str = "user:create";
pub const USER_UPDATE: &str = "user:update";
pub const USER_DELETE: &str = "user:delete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    RoleUser,
    RoleManager,
    RoleAdmin,
    RoleSuperAdmin,
}

impl Role {
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Role::RoleUser => &[USER_READ],
            Role::RoleManager => &[USER_READ, USER_UPDATE],
            Role::RoleAdmin => &[USER_READ, USER_CREATE, USER_UPDATE],
            Role::RoleSuperAdmin => &[USER_READ, USER_CREATE, USER_UPDATE, USER_DELETE],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::RoleUser => "ROLE_USER",
            Role::RoleManager => "ROLE_MANAGER",
            Role::RoleAdmin => "ROLE_ADMIN",
            Role::RoleSuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ROLE_USER" => Ok(Role::RoleUser),
            "ROLE_MANAGER" => Ok(Role::RoleManager),
            "ROLE_ADMIN" => Ok(Role::RoleAdmin),
            "ROLE_SUPER_ADMIN" => Ok(Role::RoleSuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated identity as resolved by the credential store.
///
/// The core only ever holds a transient clone of this while creating or
/// checking tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrincipal {
    pub username: String,
    pub role: Role,
    pub authorities: Vec<String>,
    pub active: bool,
    pub not_locked: bool,
}

impl UserPrincipal {
    /// Active, unlocked principal with the role's default authorities.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            authorities: role.authorities().iter().map(|a| a.to_string()).collect(),
            active: true,
            not_locked: true,
        }
    }
}
