use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at, updated_at";

/// Look up a user by email. Emails are stored lowercase; the lookup
/// normalizes the same way so login is case-insensitive.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn create(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: &str,
) -> Result<User, DatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO users (id, email, password_hash, name, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING {}",
        USER_COLUMNS
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .bind(name.trim())
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, DatabaseError> {
    let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
    let users = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(users)
}
