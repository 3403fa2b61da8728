use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Bearer-token gate for the protected route tree.
///
/// Runs before any handler or database work. A missing or non-Bearer header
/// and a bad token get distinct messages, but neither says why the token
/// failed.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

    let claims = auth::verify_jwt(&token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token."))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Pull the token out of `Authorization: Bearer <token>`. Anything else
/// (missing header, other scheme, empty token) is treated as no token.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers_with("bearer abc")), None);
    }
}
