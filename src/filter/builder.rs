use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::error::FilterError;
use super::types::{BindValue, FamilyScope, ListQuery, SqlResult};
use crate::database::models::FileType;

/// Validated list-endpoint filter. Produces ANDed SQL conjuncts with `$n`
/// placeholders; the caller owns the leading `user_id = $1` constraint and
/// tells us the first free placeholder number.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    scope: FamilyScope,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    file_type: Option<FileType>,
}

impl RecordFilter {
    /// Filter for report listings; honors the fileType parameter.
    pub fn for_reports(query: &ListQuery) -> Result<Self, FilterError> {
        let mut filter = Self::base(query)?;
        if let Some(raw) = query.file_type.as_deref() {
            let file_type = FileType::parse(raw)
                .ok_or_else(|| FilterError::InvalidFileType(raw.to_string()))?;
            filter.file_type = Some(file_type);
        }
        Ok(filter)
    }

    /// Filter for vitals listings; fileType does not apply there.
    pub fn for_vitals(query: &ListQuery) -> Result<Self, FilterError> {
        Self::base(query)
    }

    fn base(query: &ListQuery) -> Result<Self, FilterError> {
        Ok(Self {
            scope: Self::parse_scope(query.family_member_id.as_deref())?,
            start_date: Self::parse_date("startDate", query.start_date.as_deref())?,
            end_date: Self::parse_date("endDate", query.end_date.as_deref())?,
            file_type: None,
        })
    }

    pub fn scope(&self) -> FamilyScope {
        self.scope
    }

    fn parse_scope(raw: Option<&str>) -> Result<FamilyScope, FilterError> {
        match raw {
            None | Some("") => Ok(FamilyScope::Any),
            Some("self") => Ok(FamilyScope::SelfOnly),
            Some(id) => Uuid::parse_str(id)
                .map(FamilyScope::Member)
                .map_err(|_| FilterError::InvalidFamilyMemberId(id.to_string())),
        }
    }

    /// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
    fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, FilterError> {
        let Some(raw) = raw else { return Ok(None) };

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Some(midnight.and_utc()));
            }
        }
        Err(FilterError::InvalidDate { field, value: raw.to_string() })
    }

    /// Render the conjuncts. `date_column` is `test_date` for reports and
    /// `date` for vitals; `starting_param_index` is the first unused `$n`.
    pub fn to_sql(&self, date_column: &str, starting_param_index: usize) -> SqlResult {
        let mut conjuncts: Vec<String> = vec![];
        let mut params: Vec<BindValue> = vec![];
        let mut next = starting_param_index;

        match self.scope {
            FamilyScope::Any => {}
            FamilyScope::SelfOnly => {
                conjuncts.push("family_member_id IS NULL".to_string());
            }
            FamilyScope::Member(id) => {
                conjuncts.push(format!("family_member_id = ${}", next));
                params.push(BindValue::Uuid(id));
                next += 1;
            }
        }

        if let Some(start) = self.start_date {
            conjuncts.push(format!("{} >= ${}", date_column, next));
            params.push(BindValue::Timestamp(start));
            next += 1;
        }
        if let Some(end) = self.end_date {
            conjuncts.push(format!("{} <= ${}", date_column, next));
            params.push(BindValue::Timestamp(end));
            next += 1;
        }
        if let Some(file_type) = self.file_type {
            conjuncts.push(format!("file_type = ${}", next));
            params.push(BindValue::Text(file_type.as_str().to_string()));
        }

        SqlResult { query: conjuncts.join(" AND "), params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(family: Option<&str>, start: Option<&str>, end: Option<&str>, file_type: Option<&str>) -> ListQuery {
        ListQuery {
            family_member_id: family.map(String::from),
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            file_type: file_type.map(String::from),
        }
    }

    #[test]
    fn empty_query_generates_no_conjuncts() {
        let filter = RecordFilter::for_reports(&query(None, None, None, None)).unwrap();
        let sql = filter.to_sql("test_date", 2);
        assert_eq!(sql.query, "");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn self_sentinel_becomes_is_null() {
        let filter = RecordFilter::for_vitals(&query(Some("self"), None, None, None)).unwrap();
        let sql = filter.to_sql("date", 2);
        assert_eq!(sql.query, "family_member_id IS NULL");
        assert!(sql.params.is_empty());
        assert_eq!(filter.scope(), FamilyScope::SelfOnly);
    }

    #[test]
    fn member_id_becomes_equality_bind() {
        let id = Uuid::new_v4();
        let filter =
            RecordFilter::for_reports(&query(Some(&id.to_string()), None, None, None)).unwrap();
        let sql = filter.to_sql("test_date", 2);
        assert_eq!(sql.query, "family_member_id = $2");
        assert_eq!(sql.params, vec![BindValue::Uuid(id)]);
    }

    #[test]
    fn malformed_member_id_is_rejected() {
        let err = RecordFilter::for_reports(&query(Some("not-a-uuid"), None, None, None));
        assert!(matches!(err, Err(FilterError::InvalidFamilyMemberId(_))));
    }

    #[test]
    fn empty_member_id_means_unscoped() {
        let filter = RecordFilter::for_reports(&query(Some(""), None, None, None)).unwrap();
        assert_eq!(filter.scope(), FamilyScope::Any);
        assert_eq!(filter.to_sql("test_date", 2).query, "");
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        let filter = RecordFilter::for_reports(&query(
            None,
            Some("2024-01-01"),
            Some("2024-02-01T12:30:00Z"),
            None,
        ))
        .unwrap();
        let sql = filter.to_sql("test_date", 2);
        assert_eq!(sql.query, "test_date >= $2 AND test_date <= $3");
        assert_eq!(sql.params.len(), 2);
        match (&sql.params[0], &sql.params[1]) {
            (BindValue::Timestamp(start), BindValue::Timestamp(end)) => {
                assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
                assert_eq!(end.to_rfc3339(), "2024-02-01T12:30:00+00:00");
            }
            other => panic!("expected timestamp binds, got {:?}", other),
        }
    }

    #[test]
    fn start_date_alone_is_an_open_range() {
        let filter =
            RecordFilter::for_vitals(&query(None, Some("2023-06-15"), None, None)).unwrap();
        let sql = filter.to_sql("date", 2);
        assert_eq!(sql.query, "date >= $2");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        let err = RecordFilter::for_vitals(&query(None, Some("June 1st"), None, None));
        assert!(matches!(err, Err(FilterError::InvalidDate { field: "startDate", .. })));

        let err = RecordFilter::for_vitals(&query(None, None, Some("2024-13-40"), None));
        assert!(matches!(err, Err(FilterError::InvalidDate { field: "endDate", .. })));
    }

    #[test]
    fn file_type_applies_to_reports_only() {
        let q = query(Some("self"), None, None, Some("CBC"));

        let reports = RecordFilter::for_reports(&q).unwrap();
        let sql = reports.to_sql("test_date", 2);
        assert_eq!(sql.query, "family_member_id IS NULL AND file_type = $2");
        assert_eq!(sql.params, vec![BindValue::Text("CBC".to_string())]);

        let vitals = RecordFilter::for_vitals(&q).unwrap();
        assert_eq!(vitals.to_sql("date", 2).query, "family_member_id IS NULL");
    }

    #[test]
    fn unknown_file_type_is_rejected() {
        let err = RecordFilter::for_reports(&query(None, None, None, Some("selfie")));
        assert!(matches!(err, Err(FilterError::InvalidFileType(_))));
    }

    #[test]
    fn placeholders_start_where_the_caller_says() {
        let id = Uuid::new_v4();
        let filter = RecordFilter::for_reports(&query(
            Some(&id.to_string()),
            Some("2024-01-01"),
            Some("2024-12-31"),
            Some("MRI"),
        ))
        .unwrap();
        let sql = filter.to_sql("test_date", 3);
        assert_eq!(
            sql.query,
            "family_member_id = $3 AND test_date >= $4 AND test_date <= $5 AND file_type = $6"
        );
        assert_eq!(sql.params.len(), 4);
    }
}
