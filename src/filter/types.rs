use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Raw list-endpoint query parameters, exactly as the client sends them.
/// Validation happens in `RecordFilter::for_reports` / `for_vitals`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub family_member_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub file_type: Option<String>,
}

/// Which family member's records a list is scoped to.
///
/// The literal `"self"` is a sentinel for the account holder's own records,
/// which are stored with `family_member_id IS NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyScope {
    /// No constraint; records for everyone in the account.
    Any,
    /// Only the account holder's own records.
    SelfOnly,
    /// Only records linked to one family member.
    Member(Uuid),
}

/// A typed parameter destined for a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Text(String),
}

/// Generated SQL fragment plus its parameters, in placeholder order.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<BindValue>,
}
