use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded medical report. The bytes live in external storage; this row
/// keeps the delivery URL plus the metadata the user supplied at upload time.
/// `family_member_id = NULL` means the report is the account holder's own.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_member_id: Option<Uuid>,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub storage_public_id: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub test_date: DateTime<Utc>,
    pub lab_hospital: Option<String>,
    pub doctor: Option<String>,
    pub price: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report categories. The mixed casing matches the values clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    LabReport,
    Cbc,
    Prescription,
    XRay,
    Ultrasound,
    Mri,
    CtScan,
    Ecg,
    BloodTest,
    UrineTest,
    Other,
}

impl FileType {
    pub const ALL: &'static [FileType] = &[
        FileType::LabReport,
        FileType::Cbc,
        FileType::Prescription,
        FileType::XRay,
        FileType::Ultrasound,
        FileType::Mri,
        FileType::CtScan,
        FileType::Ecg,
        FileType::BloodTest,
        FileType::UrineTest,
        FileType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::LabReport => "lab_report",
            FileType::Cbc => "CBC",
            FileType::Prescription => "prescription",
            FileType::XRay => "x-ray",
            FileType::Ultrasound => "ultrasound",
            FileType::Mri => "MRI",
            FileType::CtScan => "CT_Scan",
            FileType::Ecg => "ECG",
            FileType::BloodTest => "blood_test",
            FileType::UrineTest => "urine_test",
            FileType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<FileType> {
        FileType::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_round_trips() {
        for file_type in FileType::ALL {
            assert_eq!(FileType::parse(file_type.as_str()), Some(*file_type));
        }
        assert_eq!(FileType::parse("xray"), None);
        assert_eq!(FileType::parse("cbc"), None);
        assert_eq!(FileType::parse(""), None);
    }
}
