// handlers/protected/family_members.rs - /api/family-members handlers

use axum::extract::Path;
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::api::format;
use crate::database::manager::DatabaseManager;
use crate::database::models::{BloodGroup, FamilyMember, Relation};
use crate::database::repository::family_members::{self, NewFamilyMember};
use crate::database::repository::{reports, vitals};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

const DEFAULT_COLOR: &str = "#ec4899";
const RECENT_VITALS_LIMIT: i64 = 10;

/// GET /api/family-members - All members of the caller's family, newest first.
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let members = family_members::list_for_user(&pool, user.user_id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching family members"))?;

    let count = members.len();
    let data: Vec<Value> = members.iter().map(format::family_member).collect();
    Ok(ApiResponse::success(Value::Array(data)).with_count(count))
}

/// POST /api/family-members - Add a member to the caller's family.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let new = build_new_member(&payload)?;

    let pool = DatabaseManager::pool().await?;
    let member = family_members::create_for_user(&pool, user.user_id, new)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error adding family member"))?;

    Ok(ApiResponse::created(format::family_member(&member))
        .with_message("Family member added successfully"))
}

/// GET /api/family-members/:id - One member, enriched with their report
/// count and most recent vitals.
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_member_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let member = family_members::get_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching family member"))?
        .ok_or_else(member_not_found)?;

    let reports_count = reports::count_for_member(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching family member"))?;
    let recent_vitals = vitals::recent_for_member(&pool, user.user_id, id, RECENT_VITALS_LIMIT)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error fetching family member"))?;

    Ok(ApiResponse::success(format::family_member_detail(
        &member,
        reports_count,
        &recent_vitals,
    )))
}

/// PUT /api/family-members/:id - Partial update; absent keys keep their value.
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let id = parse_member_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let mut member = family_members::get_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error updating family member"))?
        .ok_or_else(member_not_found)?;

    apply_member_update(&mut member, &payload)?;

    let updated = family_members::update_row(&pool, &member)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error updating family member"))?
        .ok_or_else(member_not_found)?;

    Ok(ApiResponse::success(format::family_member(&updated))
        .with_message("Family member updated successfully"))
}

/// DELETE /api/family-members/:id - Remove the member; their reports and
/// vitals survive, relinked to the account owner.
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_member_id(&id)?;
    let pool = DatabaseManager::pool().await?;

    let deleted = family_members::delete_for_user(&pool, user.user_id, id)
        .await
        .map_err(|err| ApiError::from(err).or_server_message("Error deleting family member"))?;
    if !deleted {
        return Err(member_not_found());
    }

    Ok(ApiResponse::message_only("Family member deleted successfully"))
}

fn member_not_found() -> ApiError {
    ApiError::not_found("Family member not found")
}

/// Ids that cannot be uuids cannot name an owned row.
fn parse_member_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| member_not_found())
}

/// Validate a creation payload. Name and relation are mandatory; color
/// falls back to the app's pink; empty optional fields stay unset.
fn build_new_member(payload: &Value) -> Result<NewFamilyMember, ApiError> {
    let name = truthy_str(payload, "name");
    let relation = truthy_str(payload, "relation");
    let (Some(name), Some(relation)) = (name, relation) else {
        return Err(ApiError::bad_request("Please provide name and relation"));
    };

    let name = checked_name(name)?;
    let relation = checked_relation(relation)?;
    let color = match truthy_str(payload, "color") {
        Some(raw) => checked_color(raw)?,
        None => DEFAULT_COLOR.to_string(),
    };

    let date_of_birth = match truthy_str(payload, "dateOfBirth") {
        Some(raw) => Some(checked_birth_date(raw)?),
        None => None,
    };
    let blood_group = match truthy_str(payload, "bloodGroup") {
        Some(raw) => Some(checked_blood_group(raw)?),
        None => None,
    };
    let allergies = match truthy_str(payload, "allergies") {
        Some(raw) => Some(checked_allergies(raw)?),
        None => None,
    };
    let medical_conditions = match truthy_str(payload, "medicalConditions") {
        Some(raw) => Some(checked_conditions(raw)?),
        None => None,
    };

    Ok(NewFamilyMember {
        name,
        relation,
        color,
        custom_id: None,
        date_of_birth,
        blood_group,
        allergies,
        medical_conditions,
    })
}

/// Merge an update payload onto an existing row. Name, relation and color
/// only change when a non-empty value arrives; the nullable fields also
/// clear when the client sends null or an empty string.
fn apply_member_update(member: &mut FamilyMember, payload: &Value) -> Result<(), ApiError> {
    if let Some(name) = truthy_str(payload, "name") {
        member.name = checked_name(name)?;
    }
    if let Some(relation) = truthy_str(payload, "relation") {
        member.relation = checked_relation(relation)?;
    }
    if let Some(color) = truthy_str(payload, "color") {
        member.color = checked_color(color)?;
    }

    if payload.get("dateOfBirth").is_some() {
        member.date_of_birth = match truthy_str(payload, "dateOfBirth") {
            Some(raw) => Some(checked_birth_date(raw)?),
            None => None,
        };
    }
    if payload.get("bloodGroup").is_some() {
        member.blood_group = match truthy_str(payload, "bloodGroup") {
            Some(raw) => Some(checked_blood_group(raw)?),
            None => None,
        };
    }
    if payload.get("allergies").is_some() {
        member.allergies = match truthy_str(payload, "allergies") {
            Some(raw) => Some(checked_allergies(raw)?),
            None => None,
        };
    }
    if payload.get("medicalConditions").is_some() {
        member.medical_conditions = match truthy_str(payload, "medicalConditions") {
            Some(raw) => Some(checked_conditions(raw)?),
            None => None,
        };
    }

    Ok(())
}

/// A present, non-empty string field; null, missing and "" all read as
/// absent, mirroring how the clients treat falsy form values.
fn truthy_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn checked_name(raw: &str) -> Result<String, ApiError> {
    let count = raw.chars().count();
    if count < 2 {
        return Err(ApiError::bad_request("Name must be at least 2 characters"));
    }
    if count > 50 {
        return Err(ApiError::bad_request("Name cannot exceed 50 characters"));
    }
    Ok(raw.to_string())
}

fn checked_relation(raw: &str) -> Result<String, ApiError> {
    Relation::parse(raw)
        .map(|relation| relation.as_str().to_string())
        .ok_or_else(|| ApiError::bad_request(format!("{} is not a valid relation", raw)))
}

fn checked_color(raw: &str) -> Result<String, ApiError> {
    let mut chars = raw.chars();
    let well_formed = raw.len() == 7
        && chars.next() == Some('#')
        && chars.all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(ApiError::bad_request("Please enter a valid hex color"));
    }
    Ok(raw.to_string())
}

fn checked_birth_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::bad_request("Invalid dateOfBirth"))
}

fn checked_blood_group(raw: &str) -> Result<String, ApiError> {
    BloodGroup::parse(raw)
        .map(|group| group.as_str().to_string())
        .ok_or_else(|| ApiError::bad_request(format!("{} is not a valid blood group", raw)))
}

fn checked_allergies(raw: &str) -> Result<String, ApiError> {
    if raw.chars().count() > 500 {
        return Err(ApiError::bad_request("Allergies text cannot exceed 500 characters"));
    }
    Ok(raw.to_string())
}

fn checked_conditions(raw: &str) -> Result<String, ApiError> {
    if raw.chars().count() > 500 {
        return Err(ApiError::bad_request(
            "Medical conditions text cannot exceed 500 characters",
        ));
    }
    Ok(raw.to_string())
}
