use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A family member profile. Reports and vitals may be linked to one of these;
/// a null link means the record belongs to the account holder themselves.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub relation: String,
    pub color: String,
    pub custom_id: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of supported relations. Stored as the canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Father,
    Mother,
    Spouse,
    Son,
    Daughter,
    Brother,
    Sister,
    Grandfather,
    Grandmother,
    Uncle,
    Aunt,
    Cousin,
    Other,
}

impl Relation {
    pub const ALL: &'static [Relation] = &[
        Relation::Father,
        Relation::Mother,
        Relation::Spouse,
        Relation::Son,
        Relation::Daughter,
        Relation::Brother,
        Relation::Sister,
        Relation::Grandfather,
        Relation::Grandmother,
        Relation::Uncle,
        Relation::Aunt,
        Relation::Cousin,
        Relation::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Father => "Father",
            Relation::Mother => "Mother",
            Relation::Spouse => "Spouse",
            Relation::Son => "Son",
            Relation::Daughter => "Daughter",
            Relation::Brother => "Brother",
            Relation::Sister => "Sister",
            Relation::Grandfather => "Grandfather",
            Relation::Grandmother => "Grandmother",
            Relation::Uncle => "Uncle",
            Relation::Aunt => "Aunt",
            Relation::Cousin => "Cousin",
            Relation::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Relation> {
        Relation::ALL.iter().copied().find(|r| r.as_str() == s)
    }
}

/// Blood groups in their clinical notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloodGroup {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodGroup {
    pub const ALL: &'static [BloodGroup] = &[
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }

    pub fn parse(s: &str) -> Option<BloodGroup> {
        BloodGroup::ALL.iter().copied().find(|g| g.as_str() == s)
    }
}
