//! Bearer-token extractors

use crate::api::AppState;
use crate::error::AppError;
use crate::models::UserProfile;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Any logged-in user
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

/// A logged-in user with the staff flag
#[derive(Debug, Clone)]
pub struct StaffUser(pub UserProfile);

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Authentication("Malformed Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Expected a Bearer token".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.accounts.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Authorization(
                "Staff access required".to_string(),
            ));
        }
        Ok(StaffUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/v1/accounts/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc123"))).unwrap(), "abc123");
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Basic dXNlcjpwdw=="))),
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer   "))),
            Err(AppError::Authentication(_))
        ));
    }
}
