// handlers/public/auth/login.rs - POST /auth/login handler

use axum::response::Json;
use serde_json::{json, Value};

use crate::api::format;
use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::repository::users;
use crate::error::ApiError;

/// POST /auth/login - Exchange email + password for a bearer token.
///
/// Unknown email and wrong password return the same 401 body, so the
/// response never reveals which check failed. The token and public user
/// fields ride at the top level of the envelope.
pub async fn login_post(Json(payload): Json<Value>) -> Result<Json<Value>, ApiError> {
    let email = payload.get("email").and_then(Value::as_str).unwrap_or("");
    let password = payload.get("password").and_then(Value::as_str).unwrap_or("");

    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Please provide email and password"));
    }

    let pool = DatabaseManager::pool().await?;
    let user = users::find_by_email(&pool, email)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Server error during login"))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !auth::verify_password(password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone(), user.name.clone()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": format::user_public(&user),
    })))
}
