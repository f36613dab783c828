use serde::{Deserialize, Serialize};
use validator::Validate;

pub const USERNAME_MAX_LENGTH: u64 = 150;

/// Registered account; `password_hash` is an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Body of `POST /register` and `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 150,
        message = "Ensure this field has no more than 150 characters and is not blank."
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

/// Issued session: the opaque token plus the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    pub token: String,
    pub username: String,
}
