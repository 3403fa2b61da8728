use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::bind_filter_params;
use crate::database::manager::DatabaseError;
use crate::database::models::Vitals;
use crate::filter::RecordFilter;

const VITALS_COLUMNS: &str = "id, user_id, family_member_id, date, systolic, diastolic, \
                              blood_sugar, weight, heart_rate, temperature, oxygen_level, \
                              notes, created_at, updated_at";

/// Fields for a new vitals entry, already range-checked.
#[derive(Debug, Clone)]
pub struct NewVitals {
    pub family_member_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub blood_sugar: Option<f64>,
    pub weight: Option<f64>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_level: Option<i32>,
    pub notes: Option<String>,
}

/// Newest entries first, capped at `limit` rows.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    filter: &RecordFilter,
    limit: i64,
) -> Result<Vec<Vitals>, DatabaseError> {
    let conditions = filter.to_sql("date", 2);

    let mut sql = format!("SELECT {} FROM vitals WHERE user_id = $1", VITALS_COLUMNS);
    if !conditions.query.is_empty() {
        sql.push_str(" AND ");
        sql.push_str(&conditions.query);
    }
    let limit_placeholder = 2 + conditions.params.len();
    sql.push_str(&format!(" ORDER BY date DESC LIMIT ${}", limit_placeholder));

    let query = sqlx::query_as::<_, Vitals>(&sql).bind(user_id);
    let entries = bind_filter_params(query, &conditions.params)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(entries)
}

pub async fn get_for_user(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Vitals>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM vitals WHERE id = $1 AND user_id = $2",
        VITALS_COLUMNS
    );
    let entry = sqlx::query_as::<_, Vitals>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(entry)
}

pub async fn create_for_user(
    pool: &PgPool,
    user_id: Uuid,
    new: NewVitals,
) -> Result<Vitals, DatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO vitals
         (id, user_id, family_member_id, date, systolic, diastolic, blood_sugar, weight,
          heart_rate, temperature, oxygen_level, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
         RETURNING {}",
        VITALS_COLUMNS
    );
    let entry = sqlx::query_as::<_, Vitals>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.family_member_id)
        .bind(new.date)
        .bind(new.systolic)
        .bind(new.diastolic)
        .bind(new.blood_sugar)
        .bind(new.weight)
        .bind(new.heart_rate)
        .bind(new.temperature)
        .bind(new.oxygen_level)
        .bind(&new.notes)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(entry)
}

/// Persist an already-merged vitals row, re-checking ownership in the WHERE.
pub async fn update_row(pool: &PgPool, entry: &Vitals) -> Result<Option<Vitals>, DatabaseError> {
    let sql = format!(
        "UPDATE vitals
         SET family_member_id = $1, date = $2, systolic = $3, diastolic = $4, blood_sugar = $5,
             weight = $6, heart_rate = $7, temperature = $8, oxygen_level = $9, notes = $10,
             updated_at = $11
         WHERE id = $12 AND user_id = $13
         RETURNING {}",
        VITALS_COLUMNS
    );
    let updated = sqlx::query_as::<_, Vitals>(&sql)
        .bind(entry.family_member_id)
        .bind(entry.date)
        .bind(entry.systolic)
        .bind(entry.diastolic)
        .bind(entry.blood_sugar)
        .bind(entry.weight)
        .bind(entry.heart_rate)
        .bind(entry.temperature)
        .bind(entry.oxygen_level)
        .bind(&entry.notes)
        .bind(Utc::now())
        .bind(entry.id)
        .bind(entry.user_id)
        .fetch_optional(pool)
        .await?;
    Ok(updated)
}

pub async fn delete_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM vitals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Most recent entries for one family member, for the member detail view.
pub async fn recent_for_member(
    pool: &PgPool,
    user_id: Uuid,
    member_id: Uuid,
    limit: i64,
) -> Result<Vec<Vitals>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM vitals WHERE user_id = $1 AND family_member_id = $2
         ORDER BY date DESC LIMIT $3",
        VITALS_COLUMNS
    );
    let entries = sqlx::query_as::<_, Vitals>(&sql)
        .bind(user_id)
        .bind(member_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(entries)
}
