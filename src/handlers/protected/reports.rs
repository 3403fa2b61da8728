// handlers/protected/reports.rs - /api/reports handlers

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Extension;
use serde_json::Value;
use uuid::Uuid;

use crate::api::format;
use crate::database::manager::DatabaseManager;
use crate::database::models::AiInsight;
use crate::database::repository::family_members::{self, MemberRef};
use crate::database::repository::{ai_insights, reports};
use crate::error::ApiError;
use crate::filter::{ListQuery, RecordFilter};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AppState;

/// GET /api/reports - The caller's reports, newest test first, filtered
/// by member, date range and file type. Each entry carries its linked
/// member and AI insight.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let filter = RecordFilter::for_reports(&query)?;
    let pool = DatabaseManager::pool().await?;

    let rows = reports::list_for_user(&pool, user.user_id, &filter)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching reports"))?;

    let refs = member_refs(&pool, user.user_id, rows.iter().filter_map(|r| r.family_member_id))
        .await
        .map_err(|err| err.or_server_message("Error fetching reports"))?;

    let file_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let insights: HashMap<Uuid, AiInsight> =
        ai_insights::list_for_files(&pool, user.user_id, &file_ids)
            .await
            .map_err(|err| ApiError::from(err).or_server_message("Error fetching reports"))?
            .into_iter()
            .map(|insight| (insight.file_id, insight))
            .collect();

    let count = rows.len();
    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            format::report(
                row,
                row.family_member_id.and_then(|id| refs.get(&id)),
                insights.get(&row.id),
            )
        })
        .collect();

    Ok(ApiResponse::success(Value::Array(data)).with_count(count))
}

/// GET /api/reports/:id - One report with its member and AI insight.
pub async fn get(Extension(user): Extension<AuthUser>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_report_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let row = reports::get_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching report"))?
        .ok_or_else(report_not_found)?;

    let refs = member_refs(&pool, user.user_id, row.family_member_id.into_iter())
        .await
        .map_err(|err| err.or_server_message("Error fetching report"))?;
    let insight = ai_insights::get_for_file(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching report"))?;

    Ok(ApiResponse::success(format::report(
        &row,
        row.family_member_id.and_then(|id| refs.get(&id)),
        insight.as_ref(),
    )))
}

/// DELETE /api/reports/:id - Remove a report, its stored file and its
/// insight. The storage delete is best effort; a provider failure never
/// leaves the row behind.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_report_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let report = reports::get_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error deleting report"))?
        .ok_or_else(report_not_found)?;

    if let Some(public_id) = report.storage_public_id.as_deref() {
        if let Err(err) = state.storage.destroy(public_id).await {
            tracing::warn!("Storage delete failed for report {}: {}", report.id, err);
        }
    }

    ai_insights::delete_for_file(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error deleting report"))?;

    let deleted = reports::delete_row(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error deleting report"))?;
    if !deleted {
        return Err(report_not_found());
    }

    Ok(ApiResponse::message_only("Report deleted successfully"))
}

fn report_not_found() -> ApiError {
    ApiError::not_found("Report not found")
}

fn parse_report_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| report_not_found())
}

/// Load the slim member projections for a set of linked ids, keyed by id.
async fn member_refs(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, MemberRef>, ApiError> {
    let mut unique: Vec<Uuid> = ids.collect();
    unique.sort_unstable();
    unique.dedup();

    let refs = family_members::refs_for_user(pool, user_id, &unique).await?;
    Ok(refs.into_iter().map(|r| (r.id, r)).collect())
}
