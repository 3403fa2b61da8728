pub mod auth;
pub mod family_members;
pub mod reports;
pub mod upload;
pub mod vitals;
