// handlers/protected/upload.rs - POST /api/reports/upload handler

use axum::extract::{Multipart, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::api::format;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ingest::{self, UploadRequest, UploadedFile};
use crate::services::AppState;

/// POST /api/reports/upload - Multipart report ingestion.
///
/// Fields: file (required), testDate (required), fileType,
/// familyMemberId, labHospital, doctor, price, notes. On success the
/// stored report and the AI insight (null when analysis was skipped)
/// come back under `data`.
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let request = read_multipart(multipart).await?;
    let pool = DatabaseManager::pool().await?;

    let (report, insight) = ingest::run(
        &pool,
        state.storage.as_ref(),
        state.analyzer.as_ref(),
        user.user_id,
        request,
    )
    .await
    .map_err(|err| err.or_server_message("Error uploading report"))?;

    let data = json!({
        "file": format::report_plain(&report),
        "aiInsight": insight.as_ref().map(format::ai_insight).unwrap_or(Value::Null),
    });

    Ok(ApiResponse::created(data).with_message("Report uploaded successfully"))
}

/// Pull the known form fields out of the multipart stream. Unknown
/// fields are skipped rather than rejected.
async fn read_multipart(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(malformed)?.to_vec();
                request.file = Some(UploadedFile {
                    bytes,
                    file_name,
                    mime_type,
                });
            }
            "fileType" => request.file_type = Some(field.text().await.map_err(malformed)?),
            "testDate" => request.test_date = Some(field.text().await.map_err(malformed)?),
            "familyMemberId" => {
                request.family_member_id = Some(field.text().await.map_err(malformed)?)
            }
            "labHospital" => request.lab_hospital = Some(field.text().await.map_err(malformed)?),
            "doctor" => request.doctor = Some(field.text().await.map_err(malformed)?),
            "price" => request.price = Some(field.text().await.map_err(malformed)?),
            "notes" => request.notes = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    Ok(request)
}

fn malformed(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed upload request: {}", err))
}
