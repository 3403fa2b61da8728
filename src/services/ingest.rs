use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::insight::ReportAnalyzer;
use super::storage::MediaStorage;
use crate::config;
use crate::database::models::{AiInsight, FileType, Report};
use crate::database::repository::reports::NewReport;
use crate::database::repository::{ai_insights, family_members, reports};
use crate::error::ApiError;
use crate::filter::FamilyScope;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "application/pdf",
];

/// One file pulled out of the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

/// Raw upload form fields, before any validation.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    pub file_type: Option<String>,
    pub test_date: Option<String>,
    pub family_member_id: Option<String>,
    pub lab_hospital: Option<String>,
    pub doctor: Option<String>,
    pub price: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug)]
struct ValidatedUpload {
    file: UploadedFile,
    file_type: FileType,
    test_date: DateTime<Utc>,
    scope: FamilyScope,
    lab_hospital: Option<String>,
    doctor: Option<String>,
    price: Option<String>,
    notes: Option<String>,
}

/// Run the full upload pipeline: validate, resolve ownership, push the
/// file to storage, insert the report row, then attempt AI analysis.
///
/// Analysis is best effort. A failed or unconfigured analyzer never
/// fails the upload; the report is returned with no insight attached.
pub async fn run(
    pool: &PgPool,
    storage: &dyn MediaStorage,
    analyzer: &dyn ReportAnalyzer,
    user_id: Uuid,
    request: UploadRequest,
) -> Result<(Report, Option<AiInsight>), ApiError> {
    let max_bytes = config::config().api.max_report_file_bytes;
    let upload = validate(request, max_bytes)?;

    let family_member_id = match upload.scope {
        FamilyScope::Member(id) => {
            family_members::get_for_user(pool, user_id, id)
                .await?
                .ok_or_else(|| ApiError::not_found("Family member not found"))?;
            Some(id)
        }
        _ => None,
    };

    let stored = storage
        .upload(&upload.file.bytes, &upload.file.file_name)
        .await?;

    let report = reports::create_for_user(
        pool,
        user_id,
        NewReport {
            family_member_id,
            file_name: upload.file.file_name.clone(),
            file_type: upload.file_type.as_str().to_string(),
            file_url: stored.url,
            storage_public_id: Some(stored.public_id),
            test_date: upload.test_date,
            lab_hospital: upload.lab_hospital,
            doctor: upload.doctor,
            price: upload.price,
            notes: upload.notes,
        },
    )
    .await?;

    let insight = annotate(pool, analyzer, user_id, &report, &upload.file).await;

    Ok((report, insight))
}

async fn annotate(
    pool: &PgPool,
    analyzer: &dyn ReportAnalyzer,
    user_id: Uuid,
    report: &Report,
    file: &UploadedFile,
) -> Option<AiInsight> {
    let payload = match analyzer
        .analyze(&file.bytes, &file.mime_type, &report.file_type)
        .await
    {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!("AI analysis skipped for report {}: {}", report.id, err);
            return None;
        }
    };

    match ai_insights::upsert_for_file(pool, user_id, report.id, &payload).await {
        Ok(insight) => Some(insight),
        Err(err) => {
            tracing::warn!("Failed to store AI insight for report {}: {}", report.id, err);
            None
        }
    }
}

/// Check the form fields in the same order clients see them reported:
/// file presence, test date presence, MIME type, size, then field-level
/// validation of the remaining values.
fn validate(request: UploadRequest, max_bytes: usize) -> Result<ValidatedUpload, ApiError> {
    let Some(file) = request.file else {
        return Err(ApiError::bad_request("Please upload a file"));
    };

    let test_date_raw = match request.test_date.as_deref() {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ApiError::bad_request("Please provide test date")),
    };

    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ApiError::bad_request(
            "File type not allowed. Please upload JPEG, PNG, WebP, or PDF",
        ));
    }

    if file.bytes.len() > max_bytes {
        return Err(ApiError::bad_request("File size exceeds 10MB limit"));
    }

    let test_date = parse_flexible_date(test_date_raw)
        .ok_or_else(|| ApiError::bad_request("Invalid test date"))?;

    let file_type = match request.file_type.as_deref() {
        None | Some("") => FileType::LabReport,
        Some(raw) => FileType::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("{} is not a valid file type", raw)))?,
    };

    let scope = match request.family_member_id.as_deref() {
        None | Some("") | Some("self") => FamilyScope::SelfOnly,
        Some(raw) => Uuid::parse_str(raw)
            .map(FamilyScope::Member)
            .map_err(|_| ApiError::bad_request(format!("Invalid familyMemberId: {}", raw)))?,
    };

    let lab_hospital = bounded_text(
        request.lab_hospital,
        100,
        "Lab/Hospital name cannot exceed 100 characters",
    )?;
    let doctor = bounded_text(request.doctor, 100, "Doctor name cannot exceed 100 characters")?;
    let notes = bounded_text(request.notes, 500, "Notes cannot exceed 500 characters")?;
    let price = request
        .price
        .map(|price| price.trim().to_string())
        .filter(|price| !price.is_empty());

    Ok(ValidatedUpload {
        file,
        file_type,
        test_date,
        scope,
        lab_hospital,
        doctor,
        price,
        notes,
    })
}

/// Trim an optional text field; empty becomes absent, over-long is an error.
fn bounded_text(
    raw: Option<String>,
    max_chars: usize,
    too_long: &str,
) -> Result<Option<String>, ApiError> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::bad_request(too_long));
    }
    Ok(Some(trimmed.to_string()))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
