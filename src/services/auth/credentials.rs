//! Credential store seam.
//!
//! The core never owns user records. It asks a `CredentialStore` for the
//! principal behind a username, for a password check, and to persist the lock
//! flag. `InMemoryCredentialStore` backs the binary and the tests; a database
//! implementation plugs in behind the same trait.
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SeedUser;
use crate::services::auth::principal::{Role, UnknownRole, UserPrincipal};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential backend error: {0}")]
    Backend(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Role(#[from] UnknownRole),
}

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserPrincipal>, CredentialError>;

    /// `Ok(false)` for unknown users as well as wrong passwords.
    async fn verify_password(&self, username: &str, password: &str)
    -> Result<bool, CredentialError>;

    async fn set_not_locked(&self, username: &str, not_locked: bool)
    -> Result<(), CredentialError>;
}

#[derive(Debug, Clone)]
struct StoredUser {
    principal: UserPrincipal,
    // Argon2id PHC string
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<DashMap<String, StoredUser>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &[SeedUser]) -> Result<Self, CredentialError> {
        let store = Self::new();
        for user in seed {
            let role: Role = user.role.parse()?;
            store.insert(UserPrincipal::new(&user.username, role), &user.password)?;
        }
        Ok(store)
    }

    pub fn insert(&self, principal: UserPrincipal, password: &str) -> Result<(), CredentialError> {
        let password_hash = hash_password(password)?;
        self.users.insert(
            principal.username.clone(),
            StoredUser {
                principal,
                password_hash,
            },
        );
        Ok(())
    }

    /// Swap the user's role and re-derive authorities from it.
    pub fn set_role(&self, username: &str, role: Role) -> bool {
        self.update(username, |p| {
            p.role = role;
            p.authorities = role.authorities().iter().map(|a| a.to_string()).collect();
        })
    }

    pub fn set_active(&self, username: &str, active: bool) -> bool {
        self.update(username, |p| p.active = active)
    }

    fn update(&self, username: &str, f: impl FnOnce(&mut UserPrincipal)) -> bool {
        match self.users.get_mut(username) {
            Some(mut user) => {
                f(&mut user.principal);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserPrincipal>, CredentialError> {
        Ok(self.users.get(username).map(|u| u.principal.clone()))
    }

    async fn verify_password(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let Some(hash) = self.users.get(username).map(|u| u.password_hash.clone()) else {
            return Ok(false);
        };
        let password = password.to_string();

        // Argon2 is deliberately slow; keep it off the async workers.
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }

    async fn set_not_locked(&self, username: &str, not_locked: bool) -> Result<(), CredentialError> {
        if self.update(username, |p| p.not_locked = not_locked) {
            Ok(())
        } else {
            Err(CredentialError::Backend(format!("no such user: {username}")))
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
