use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::bind_filter_params;
use crate::database::manager::DatabaseError;
use crate::database::models::Report;
use crate::filter::RecordFilter;

const REPORT_COLUMNS: &str = "id, user_id, family_member_id, file_name, file_type, file_url, \
                              storage_public_id, upload_date, test_date, lab_hospital, doctor, \
                              price, notes, created_at, updated_at";

/// Fields for a new report row. Validation and storage upload happen first;
/// by the time this exists the file already lives at `file_url`.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub family_member_id: Option<Uuid>,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub storage_public_id: Option<String>,
    pub test_date: DateTime<Utc>,
    pub lab_hospital: Option<String>,
    pub doctor: Option<String>,
    pub price: Option<String>,
    pub notes: Option<String>,
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    filter: &RecordFilter,
) -> Result<Vec<Report>, DatabaseError> {
    let conditions = filter.to_sql("test_date", 2);

    let mut sql = format!("SELECT {} FROM files WHERE user_id = $1", REPORT_COLUMNS);
    if !conditions.query.is_empty() {
        sql.push_str(" AND ");
        sql.push_str(&conditions.query);
    }
    sql.push_str(" ORDER BY test_date DESC");

    let query = sqlx::query_as::<_, Report>(&sql).bind(user_id);
    let reports = bind_filter_params(query, &conditions.params)
        .fetch_all(pool)
        .await?;
    Ok(reports)
}

pub async fn get_for_user(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Report>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM files WHERE id = $1 AND user_id = $2",
        REPORT_COLUMNS
    );
    let report = sqlx::query_as::<_, Report>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(report)
}

pub async fn create_for_user(
    pool: &PgPool,
    user_id: Uuid,
    new: NewReport,
) -> Result<Report, DatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO files
         (id, user_id, family_member_id, file_name, file_type, file_url, storage_public_id,
          upload_date, test_date, lab_hospital, doctor, price, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
         RETURNING {}",
        REPORT_COLUMNS
    );
    let report = sqlx::query_as::<_, Report>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.family_member_id)
        .bind(&new.file_name)
        .bind(&new.file_type)
        .bind(&new.file_url)
        .bind(&new.storage_public_id)
        .bind(now)
        .bind(new.test_date)
        .bind(&new.lab_hospital)
        .bind(&new.doctor)
        .bind(&new.price)
        .bind(&new.notes)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(report)
}

/// Remove the row itself. Storage cleanup and insight deletion are sequenced
/// by the caller before this runs.
pub async fn delete_row(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_for_member(
    pool: &PgPool,
    user_id: Uuid,
    member_id: Uuid,
) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM files WHERE user_id = $1 AND family_member_id = $2",
    )
    .bind(user_id)
    .bind(member_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
