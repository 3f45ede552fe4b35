use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::{jwt::JwtKeys, password::Passwords};
use crate::store::UserStore;

#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown user and wrong password are deliberately the same value.
    #[error("{}", crate::error::INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    pub name: String,
}

/// Checks credentials against the user store and issues signed tokens.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    passwords: Passwords,
    keys: JwtKeys,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, passwords: Passwords, keys: JwtKeys) -> Self {
        Self {
            users,
            passwords,
            keys,
        }
    }

    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, LoginError> {
        let (username, password) = match (credentials.username, credentials.password) {
            (Some(u), Some(p)) => (u, p),
            (_, password) => {
                warn!("login with incomplete credentials");
                self.passwords
                    .verify_blocking(password.unwrap_or_default(), None)
                    .await?;
                return Err(LoginError::InvalidCredentials);
            }
        };

        let user = self
            .users
            .find_by_username(&username)
            .await
            .context("look up user for login")?;

        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let matched = self.passwords.verify_blocking(password, stored).await?;

        let user = match user {
            Some(u) if matched => u,
            _ => {
                warn!("login rejected");
                return Err(LoginError::InvalidCredentials);
            }
        };

        let token = self
            .keys
            .sign(&user.username, user.id)
            .context("sign login token")?;

        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(IssuedToken {
            token,
            username: user.username,
            name: user.name,
        })
    }
}
