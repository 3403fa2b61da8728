use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid familyMemberId: {0}")]
    InvalidFamilyMemberId(String),

    #[error("Invalid {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid fileType: {0}")]
    InvalidFileType(String),
}
