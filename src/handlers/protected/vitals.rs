// handlers/protected/vitals.rs - /api/vitals handlers

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::format;
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::Vitals;
use crate::database::repository::family_members::{self, MemberRef};
use crate::database::repository::vitals::{self as vitals_repo, NewVitals};
use crate::error::ApiError;
use crate::filter::{FamilyScope, ListQuery, RecordFilter};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/vitals - Recent vitals for the caller, newest first, capped
/// at the configured window, filtered by member and date range.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let filter = RecordFilter::for_vitals(&query)?;
    let limit = config::config().api.vitals_list_limit;
    let pool = DatabaseManager::pool().await?;

    let rows = vitals_repo::list_for_user(&pool, user.user_id, &filter, limit)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching vitals"))?;

    let refs = member_refs(&pool, user.user_id, rows.iter().filter_map(|r| r.family_member_id))
        .await
        .map_err(|err| err.or_server_message("Error fetching vitals"))?;

    let count = rows.len();
    let data: Vec<Value> = rows
        .iter()
        .map(|row| format::vitals(row, row.family_member_id.and_then(|id| refs.get(&id))))
        .collect();

    Ok(ApiResponse::success(Value::Array(data)).with_count(count))
}

/// POST /api/vitals - Record a set of measurements.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let (scope, mut new) = build_new_vitals(&payload)?;

    let pool = DatabaseManager::pool().await?;
    new.family_member_id = confirm_member_link(&pool, user.user_id, scope).await?;

    let row = vitals_repo::create_for_user(&pool, user.user_id, new)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error adding vital"))?;

    Ok(ApiResponse::created(format::vitals_plain(&row)).with_message("Vital added successfully"))
}

/// PUT /api/vitals/:id - Partial update; absent keys keep their value,
/// null clears.
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let id = parse_vital_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let mut row = vitals_repo::get_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error updating vital"))?
        .ok_or_else(vital_not_found)?;

    let link_change = apply_vitals_update(&mut row, &payload)?;
    if let Some(scope) = link_change {
        row.family_member_id = confirm_member_link(&pool, user.user_id, scope).await?;
    }

    let updated = vitals_repo::update_row(&pool, &row)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error updating vital"))?
        .ok_or_else(vital_not_found)?;

    Ok(ApiResponse::success(format::vitals_plain(&updated))
        .with_message("Vital updated successfully"))
}

/// DELETE /api/vitals/:id - Remove one vitals entry.
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_vital_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let deleted = vitals_repo::delete_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error deleting vital"))?;
    if !deleted {
        return Err(vital_not_found());
    }

    Ok(ApiResponse::message_only("Vital deleted successfully"))
}

fn vital_not_found() -> ApiError {
    ApiError::not_found("Vital not found")
}

fn parse_vital_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| vital_not_found())
}

async fn member_refs(
    pool: &PgPool,
    user_id: Uuid,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, MemberRef>, ApiError> {
    let mut unique: Vec<Uuid> = ids.collect();
    unique.sort_unstable();
    unique.dedup();

    let refs = family_members::refs_for_user(pool, user_id, &unique).await?;
    Ok(refs.into_iter().map(|r| (r.id, r)).collect())
}

/// A linked member must exist and belong to the caller; `self` and empty
/// values mean the entry belongs to the account owner directly.
async fn confirm_member_link(
    pool: &PgPool,
    user_id: Uuid,
    scope: FamilyScope,
) -> Result<Option<Uuid>, ApiError> {
    match scope {
        FamilyScope::Member(id) => {
            family_members::get_for_user(pool, user_id, id)
                .await?
                .ok_or_else(|| ApiError::not_found("Family member not found"))?;
            Ok(Some(id))
        }
        _ => Ok(None),
    }
}

/// Validate a creation payload: the date is mandatory, at least one
/// non-zero measurement must be present, and every measurement must sit
/// inside its plausible range.
fn build_new_vitals(payload: &Value) -> Result<(FamilyScope, NewVitals), ApiError> {
    let date_raw = payload
        .get("date")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please provide date"))?;

    let blood_pressure = payload.get("bloodPressure").filter(|bp| !bp.is_null());
    if let Some(bp) = blood_pressure {
        if !bp.is_object() {
            return Err(ApiError::bad_request("Invalid bloodPressure value"));
        }
    }
    let systolic = int_field(
        blood_pressure.and_then(|bp| bp.get("systolic")),
        "Invalid systolic value",
    )?;
    let diastolic = int_field(
        blood_pressure.and_then(|bp| bp.get("diastolic")),
        "Invalid diastolic value",
    )?;
    let blood_sugar = float_field(payload.get("bloodSugar"), "Invalid bloodSugar value")?;
    let weight = float_field(payload.get("weight"), "Invalid weight value")?;
    let heart_rate = int_field(payload.get("heartRate"), "Invalid heartRate value")?;
    let temperature = float_field(payload.get("temperature"), "Invalid temperature value")?;
    let oxygen_level = int_field(payload.get("oxygenLevel"), "Invalid oxygenLevel value")?;

    let has_measurement = systolic.is_some_and(|v| v != 0)
        || diastolic.is_some_and(|v| v != 0)
        || blood_sugar.is_some_and(|v| v != 0.0)
        || weight.is_some_and(|v| v != 0.0)
        || heart_rate.is_some_and(|v| v != 0)
        || temperature.is_some_and(|v| v != 0.0)
        || oxygen_level.is_some_and(|v| v != 0);
    if !has_measurement {
        return Err(ApiError::bad_request("Please provide at least one vital measurement"));
    }

    let date = parse_vitals_date(date_raw)?;
    check_measurement_ranges(
        systolic,
        diastolic,
        blood_sugar,
        weight,
        heart_rate,
        temperature,
        oxygen_level,
    )?;
    let notes = notes_field(payload.get("notes"))?;
    let scope = member_scope(payload.get("familyMemberId"))?;

    Ok((
        scope,
        NewVitals {
            family_member_id: None,
            date,
            systolic,
            diastolic,
            blood_sugar,
            weight,
            heart_rate,
            temperature,
            oxygen_level,
            notes,
        },
    ))
}

/// Merge an update payload onto an existing entry. Returns the new
/// member link when the payload addressed it, None to keep the current
/// one. A present bloodPressure object replaces both sides wholesale.
fn apply_vitals_update(
    entry: &mut Vitals,
    payload: &Value,
) -> Result<Option<FamilyScope>, ApiError> {
    if let Some(raw) = payload
        .get("date")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        entry.date = parse_vitals_date(raw)?;
    }

    match payload.get("bloodPressure") {
        None => {}
        Some(Value::Null) => {
            entry.systolic = None;
            entry.diastolic = None;
        }
        Some(bp) if bp.is_object() => {
            entry.systolic = int_field(bp.get("systolic"), "Invalid systolic value")?;
            entry.diastolic = int_field(bp.get("diastolic"), "Invalid diastolic value")?;
        }
        Some(_) => return Err(ApiError::bad_request("Invalid bloodPressure value")),
    }

    if let Some(value) = payload.get("bloodSugar") {
        entry.blood_sugar = float_field(Some(value), "Invalid bloodSugar value")?;
    }
    if let Some(value) = payload.get("weight") {
        entry.weight = float_field(Some(value), "Invalid weight value")?;
    }
    if let Some(value) = payload.get("heartRate") {
        entry.heart_rate = int_field(Some(value), "Invalid heartRate value")?;
    }
    if let Some(value) = payload.get("temperature") {
        entry.temperature = float_field(Some(value), "Invalid temperature value")?;
    }
    if let Some(value) = payload.get("oxygenLevel") {
        entry.oxygen_level = int_field(Some(value), "Invalid oxygenLevel value")?;
    }
    if let Some(value) = payload.get("notes") {
        entry.notes = notes_field(Some(value))?;
    }

    check_measurement_ranges(
        entry.systolic,
        entry.diastolic,
        entry.blood_sugar,
        entry.weight,
        entry.heart_rate,
        entry.temperature,
        entry.oxygen_level,
    )?;

    match payload.get("familyMemberId") {
        None => Ok(None),
        Some(value) => Ok(Some(member_scope(Some(value))?)),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_measurement_ranges(
    systolic: Option<i32>,
    diastolic: Option<i32>,
    blood_sugar: Option<f64>,
    weight: Option<f64>,
    heart_rate: Option<i32>,
    temperature: Option<f64>,
    oxygen_level: Option<i32>,
) -> Result<(), ApiError> {
    range_i32(
        systolic,
        50,
        250,
        "Systolic pressure cannot be less than 50",
        "Systolic pressure cannot exceed 250",
    )?;
    range_i32(
        diastolic,
        30,
        150,
        "Diastolic pressure cannot be less than 30",
        "Diastolic pressure cannot exceed 150",
    )?;
    range_f64(
        blood_sugar,
        20.0,
        600.0,
        "Blood sugar cannot be less than 20",
        "Blood sugar cannot exceed 600",
    )?;
    range_f64(
        weight,
        1.0,
        500.0,
        "Weight cannot be less than 1 kg",
        "Weight cannot exceed 500 kg",
    )?;
    range_i32(
        heart_rate,
        30,
        220,
        "Heart rate cannot be less than 30",
        "Heart rate cannot exceed 220",
    )?;
    range_f64(
        temperature,
        35.0,
        42.0,
        "Temperature cannot be less than 35°C",
        "Temperature cannot exceed 42°C",
    )?;
    range_i32(
        oxygen_level,
        70,
        100,
        "Oxygen level cannot be less than 70%",
        "Oxygen level cannot exceed 100%",
    )?;
    Ok(())
}

fn range_i32(
    value: Option<i32>,
    min: i32,
    max: i32,
    too_low: &str,
    too_high: &str,
) -> Result<(), ApiError> {
    if let Some(v) = value {
        if v < min {
            return Err(ApiError::bad_request(too_low));
        }
        if v > max {
            return Err(ApiError::bad_request(too_high));
        }
    }
    Ok(())
}

fn range_f64(
    value: Option<f64>,
    min: f64,
    max: f64,
    too_low: &str,
    too_high: &str,
) -> Result<(), ApiError> {
    if let Some(v) = value {
        if v < min {
            return Err(ApiError::bad_request(too_low));
        }
        if v > max {
            return Err(ApiError::bad_request(too_high));
        }
    }
    Ok(())
}

/// Whole numbers only; floats with no fraction are accepted.
fn int_field(value: Option<&Value>, invalid: &str) -> Result<Option<i32>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v
                .as_f64()
                .ok_or_else(|| ApiError::bad_request(invalid.to_string()))?;
            if n.fract() != 0.0 {
                return Err(ApiError::bad_request(invalid.to_string()));
            }
            Ok(Some(n as i32))
        }
    }
}

fn float_field(value: Option<&Value>, invalid: &str) -> Result<Option<f64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(invalid.to_string())),
    }
}

fn notes_field(value: Option<&Value>) -> Result<Option<String>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > 500 {
                return Err(ApiError::bad_request("Notes cannot exceed 500 characters"));
            }
            Ok(Some(trimmed.to_string()))
        }
        Some(_) => Err(ApiError::bad_request("Invalid notes value")),
    }
}

fn member_scope(value: Option<&Value>) -> Result<FamilyScope, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(FamilyScope::SelfOnly),
        Some(Value::String(raw)) if raw.is_empty() || raw == "self" => Ok(FamilyScope::SelfOnly),
        Some(Value::String(raw)) => Uuid::parse_str(raw)
            .map(FamilyScope::Member)
            .map_err(|_| ApiError::bad_request(format!("Invalid familyMemberId: {}", raw))),
        Some(other) => Err(ApiError::bad_request(format!(
            "Invalid familyMemberId: {}",
            other
        ))),
    }
}

fn parse_vitals_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::bad_request("Invalid date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing_entry() -> Vitals {
        Vitals {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_member_id: Some(Uuid::new_v4()),
            date: Utc::now(),
            systolic: Some(120),
            diastolic: Some(80),
            blood_sugar: None,
            weight: Some(72.0),
            heart_rate: None,
            temperature: None,
            oxygen_level: None,
            notes: Some("fasting".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn creation_requires_a_date() {
        let err = build_new_vitals(&json!({ "weight": 70 })).unwrap_err();
        assert_eq!(err.message(), "Please provide date");
    }

    #[test]
    fn creation_requires_a_measurement() {
        let err = build_new_vitals(&json!({ "date": "2024-03-01" })).unwrap_err();
        assert_eq!(err.message(), "Please provide at least one vital measurement");

        let err = build_new_vitals(&json!({ "date": "2024-03-01", "notes": "felt fine" }))
            .unwrap_err();
        assert_eq!(err.message(), "Please provide at least one vital measurement");
    }

    #[test]
    fn zero_measurements_do_not_count() {
        let err = build_new_vitals(&json!({
            "date": "2024-03-01",
            "bloodPressure": { "systolic": 0 }
        }))
        .unwrap_err();
        assert_eq!(err.message(), "Please provide at least one vital measurement");
    }

    #[test]
    fn out_of_range_measurements_are_rejected() {
        let cases = [
            (json!({ "bloodPressure": { "systolic": 300 } }), "Systolic pressure cannot exceed 250"),
            (json!({ "bloodPressure": { "systolic": 120, "diastolic": 20 } }), "Diastolic pressure cannot be less than 30"),
            (json!({ "bloodSugar": 700 }), "Blood sugar cannot exceed 600"),
            (json!({ "weight": 0.5 }), "Weight cannot be less than 1 kg"),
            (json!({ "heartRate": 250 }), "Heart rate cannot exceed 220"),
            (json!({ "temperature": 34 }), "Temperature cannot be less than 35°C"),
            (json!({ "oxygenLevel": 101 }), "Oxygen level cannot exceed 100%"),
        ];

        for (mut body, message) in cases {
            body["date"] = json!("2024-03-01");
            let err = build_new_vitals(&body).unwrap_err();
            assert_eq!(err.message(), message);
        }
    }

    #[test]
    fn creation_parses_links_and_dates() {
        let member_id = Uuid::new_v4();
        let (scope, new) = build_new_vitals(&json!({
            "date": "2024-03-01",
            "bloodPressure": { "systolic": 120, "diastolic": 80 },
            "weight": 72.5,
            "familyMemberId": member_id.to_string(),
        }))
        .unwrap();

        assert_eq!(scope, FamilyScope::Member(member_id));
        assert_eq!(new.systolic, Some(120));
        assert_eq!(new.diastolic, Some(80));
        assert_eq!(new.weight, Some(72.5));
        assert_eq!(new.date.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn self_sentinel_means_no_link() {
        let (scope, _) = build_new_vitals(&json!({
            "date": "2024-03-01",
            "weight": 70,
            "familyMemberId": "self",
        }))
        .unwrap();
        assert_eq!(scope, FamilyScope::SelfOnly);
    }

    #[test]
    fn garbage_dates_and_ids_are_rejected() {
        let err = build_new_vitals(&json!({ "date": "soon", "weight": 70 })).unwrap_err();
        assert_eq!(err.message(), "Invalid date");

        let err = build_new_vitals(&json!({
            "date": "2024-03-01",
            "weight": 70,
            "familyMemberId": "abc",
        }))
        .unwrap_err();
        assert_eq!(err.message(), "Invalid familyMemberId: abc");
    }

    #[test]
    fn update_replaces_blood_pressure_wholesale() {
        let mut entry = existing_entry();
        let link = apply_vitals_update(
            &mut entry,
            &json!({ "bloodPressure": { "systolic": 130 } }),
        )
        .unwrap();

        assert_eq!(link, None);
        assert_eq!(entry.systolic, Some(130));
        assert_eq!(entry.diastolic, None);
    }

    #[test]
    fn update_clears_fields_on_null() {
        let mut entry = existing_entry();
        apply_vitals_update(
            &mut entry,
            &json!({ "bloodPressure": null, "weight": null, "notes": null }),
        )
        .unwrap();

        assert_eq!(entry.systolic, None);
        assert_eq!(entry.diastolic, None);
        assert_eq!(entry.weight, None);
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn update_keeps_untouched_fields() {
        let mut entry = existing_entry();
        let before_link = entry.family_member_id;
        let link = apply_vitals_update(&mut entry, &json!({ "heartRate": 64 })).unwrap();

        assert_eq!(link, None);
        assert_eq!(entry.heart_rate, Some(64));
        assert_eq!(entry.systolic, Some(120));
        assert_eq!(entry.family_member_id, before_link);
    }

    #[test]
    fn update_validates_replacement_values() {
        let mut entry = existing_entry();
        let err = apply_vitals_update(&mut entry, &json!({ "temperature": 45 })).unwrap_err();
        assert_eq!(err.message(), "Temperature cannot exceed 42°C");

        let err = apply_vitals_update(&mut entry, &json!({ "heartRate": "fast" })).unwrap_err();
        assert_eq!(err.message(), "Invalid heartRate value");
    }

    #[test]
    fn update_can_relink_and_unlink() {
        let mut entry = existing_entry();
        let link = apply_vitals_update(&mut entry, &json!({ "familyMemberId": "self" })).unwrap();
        assert_eq!(link, Some(FamilyScope::SelfOnly));

        let target = Uuid::new_v4();
        let link = apply_vitals_update(
            &mut entry,
            &json!({ "familyMemberId": target.to_string() }),
        )
        .unwrap();
        assert_eq!(link, Some(FamilyScope::Member(target)));
    }
}
