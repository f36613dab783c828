use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use super::HttpState;
use crate::domain::error::AppError;
use crate::domain::user::User;

/// The caller behind `Authorization: Token <key>`; rejects with 401.
pub struct AuthenticatedUser(pub User);

/// Accepts `Token <key>` and, for convenience, `Bearer <key>`.
pub fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        let key = key.trim();
        (!key.is_empty()).then_some(key)
    } else {
        None
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(token_from_header)
            .map(str::to_string);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Internal("HTTP state not configured".to_string()))?;
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })?;
            state.auth.authenticate(&token).await.map(AuthenticatedUser)
        })
    }
}
