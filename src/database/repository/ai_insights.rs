use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::AiInsight;
use crate::services::insight::InsightPayload;

const INSIGHT_COLUMNS: &str = "id, file_id, user_id, summary_english, summary_urdu, \
                               abnormal_values, questions_to_ask, food_recommendations, \
                               home_remedies, disclaimer, created_at, updated_at";

/// Insert or replace the insight for a file. `file_id` is UNIQUE, so a
/// re-analysis overwrites the previous summary instead of piling up rows.
pub async fn upsert_for_file(
    pool: &PgPool,
    user_id: Uuid,
    file_id: Uuid,
    payload: &InsightPayload,
) -> Result<AiInsight, DatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO ai_insights
         (id, file_id, user_id, summary_english, summary_urdu, abnormal_values,
          questions_to_ask, food_recommendations, home_remedies, disclaimer,
          created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
         ON CONFLICT (file_id) DO UPDATE SET
             summary_english = EXCLUDED.summary_english,
             summary_urdu = EXCLUDED.summary_urdu,
             abnormal_values = EXCLUDED.abnormal_values,
             questions_to_ask = EXCLUDED.questions_to_ask,
             food_recommendations = EXCLUDED.food_recommendations,
             home_remedies = EXCLUDED.home_remedies,
             disclaimer = EXCLUDED.disclaimer,
             updated_at = EXCLUDED.updated_at
         RETURNING {}",
        INSIGHT_COLUMNS
    );
    let insight = sqlx::query_as::<_, AiInsight>(&sql)
        .bind(Uuid::new_v4())
        .bind(file_id)
        .bind(user_id)
        .bind(&payload.summary_english)
        .bind(&payload.summary_urdu)
        .bind(&payload.abnormal_values)
        .bind(&payload.questions_to_ask)
        .bind(&payload.food_recommendations)
        .bind(&payload.home_remedies)
        .bind(&payload.disclaimer)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(insight)
}

pub async fn get_for_file(
    pool: &PgPool,
    user_id: Uuid,
    file_id: Uuid,
) -> Result<Option<AiInsight>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM ai_insights WHERE file_id = $1 AND user_id = $2",
        INSIGHT_COLUMNS
    );
    let insight = sqlx::query_as::<_, AiInsight>(&sql)
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(insight)
}

/// One batched lookup for a page of reports, instead of a query per row.
pub async fn list_for_files(
    pool: &PgPool,
    user_id: Uuid,
    file_ids: &[Uuid],
) -> Result<Vec<AiInsight>, DatabaseError> {
    if file_ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "SELECT {} FROM ai_insights WHERE user_id = $1 AND file_id = ANY($2)",
        INSIGHT_COLUMNS
    );
    let insights = sqlx::query_as::<_, AiInsight>(&sql)
        .bind(user_id)
        .bind(file_ids.to_vec())
        .fetch_all(pool)
        .await?;
    Ok(insights)
}

pub async fn delete_for_file(pool: &PgPool, user_id: Uuid, file_id: Uuid) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM ai_insights WHERE file_id = $1 AND user_id = $2")
        .bind(file_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
