// handlers/public/auth/register.rs - POST /auth/register handler

use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use crate::api::format;
use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::repository::{is_unique_violation, users};
use crate::error::ApiError;

/// POST /auth/register - Create an account and log straight in.
///
/// Responds like login does: 201 with the token and public user fields
/// at the top level, so clients share one success path for both.
pub async fn register_post(
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (name, email, password) = validate_registration(&payload)?;

    let pool = DatabaseManager::pool().await?;

    if users::find_by_email(&pool, &email)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Server error during registration"))?
        .is_some()
    {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = auth::hash_password(&password)?;
    let user = match users::create(&pool, &email, &password_hash, &name).await {
        Ok(user) => user,
        // Two concurrent registrations can both pass the lookup above;
        // the unique index decides the race.
        Err(err) if is_unique_violation(&err) => {
            return Err(ApiError::conflict("An account with this email already exists"));
        }
        Err(err) => {
            return Err(ApiError::from(err).or_server_message("Server error during registration"));
        }
    };

    let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone(), user.name.clone()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "token": token,
            "user": format::user_public(&user),
        })),
    ))
}

/// Field checks an account must pass before anything touches the database.
fn validate_registration(payload: &Value) -> Result<(String, String, String), ApiError> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    let password = payload.get("password").and_then(Value::as_str).unwrap_or("");

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Please provide name, email and password"));
    }

    if !is_plausible_email(email) {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }

    if password.chars().count() < 6 {
        return Err(ApiError::bad_request("Password must be at least 6 characters"));
    }

    Ok((
        name.to_string(),
        email.to_lowercase(),
        password.to_string(),
    ))
}

/// Loose shape check: something before the @, a domain with a dot after it.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(name: &str, email: &str, password: &str) -> Value {
        json!({ "name": name, "email": email, "password": password })
    }

    #[test]
    fn missing_fields_are_rejected_together() {
        let err = validate_registration(&json!({ "email": "a@b.co" })).unwrap_err();
        assert_eq!(err.message(), "Please provide name, email and password");

        let err = validate_registration(&body("Sana", "  ", "secret1")).unwrap_err();
        assert_eq!(err.message(), "Please provide name, email and password");
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["plainaddress", "@nodomain.com", "user@", "user@nodot", "a b@c.co"] {
            let err = validate_registration(&body("Sana", bad, "secret1")).unwrap_err();
            assert_eq!(err.message(), "Please enter a valid email address");
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        let err = validate_registration(&body("Sana", "sana@example.com", "12345")).unwrap_err();
        assert_eq!(err.message(), "Password must be at least 6 characters");
    }

    #[test]
    fn email_is_normalized_to_lowercase() {
        let (name, email, _) =
            validate_registration(&body(" Sana ", "Sana@Example.COM", "secret1")).unwrap();
        assert_eq!(name, "Sana");
        assert_eq!(email, "sana@example.com");
    }
}
