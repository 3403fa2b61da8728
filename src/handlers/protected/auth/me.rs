// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - Echo the identity carried by the bearer token.
pub async fn me_get(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": user.user_id,
        "name": user.name,
        "email": user.email,
    })))
}
