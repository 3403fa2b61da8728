use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// AI-generated summary of one report. `file_id` is UNIQUE; re-analyzing a
/// report replaces its insight instead of accumulating duplicates.
///
/// The structured sections are stored as JSONB exactly as the model produced
/// them: `abnormal_values` is an array of strings, `questions_to_ask` an array
/// of `{question}`, `food_recommendations` an `{avoid, recommended}` object,
/// `home_remedies` an array of `{remedy, description}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AiInsight {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub summary_english: String,
    pub summary_urdu: String,
    pub abnormal_values: Value,
    pub questions_to_ask: Value,
    pub food_recommendations: Value,
    pub home_remedies: Value,
    pub disclaimer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
