use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::user::{AuthToken, Credentials, User};
use crate::infrastructure::db::users::UserRepository;

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub struct AuthUseCase {
    repository: Arc<UserRepository>,
}

impl AuthUseCase {
    pub fn new(repository: Arc<UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, credentials: Credentials) -> Result<AuthToken> {
        let credentials = normalize(credentials);
        credentials.validate()?;
        if !USERNAME_PATTERN.is_match(&credentials.username) {
            return Err(AppError::field(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ));
        }

        let password = credentials.password.clone();
        let password_hash = off_worker(move || hash_password(&password)).await?;
        let user = self
            .repository
            .insert_user(&credentials.username, &password_hash)
            .await?;
        info!(username = %user.username, "Registered user");

        self.issue(user).await
    }

    pub async fn login(&self, credentials: Credentials) -> Result<AuthToken> {
        let credentials = normalize(credentials);
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        let user = match self.repository.find_by_username(&credentials.username).await? {
            Some(user) => user,
            None => {
                warn!(username = %credentials.username, "Login for unknown user");
                return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
            }
        };

        let password = credentials.password.clone();
        let stored_hash = user.password_hash.clone();
        if !off_worker(move || verify_password(&password, &stored_hash)).await? {
            warn!(username = %user.username, "Login with wrong password");
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        self.issue(user).await
    }

    /// Resolves a token to its user, `Unauthorized` when unknown.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            ));
        }
        self.repository
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token.".to_string()))
    }

    async fn issue(&self, user: User) -> Result<AuthToken> {
        let token = self.repository.get_or_create_token(user.id).await?;
        Ok(AuthToken {
            token,
            username: user.username,
        })
    }
}

fn normalize(credentials: Credentials) -> Credentials {
    Credentials {
        username: credentials.username.trim().to_string(),
        password: credentials.password,
    }
}

/// Runs CPU-bound password work on the blocking pool.
async fn off_worker<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {e}")))?
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {e}")))?;

    // Mismatch is a normal outcome, not an error
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
