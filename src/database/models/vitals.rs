use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A manual vitals entry. Measurements are individually optional but at least
/// one must be present; blood pressure is stored as its two components and
/// nested back into `bloodPressure` at the wire boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vitals {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
