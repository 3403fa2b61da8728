// Ownership-scoped data access. Every query in this tree carries the caller's
// user_id in its WHERE clause; a row owned by someone else behaves exactly
// like a row that does not exist.
pub mod users;
pub mod family_members;
pub mod reports;
pub mod vitals;
pub mod ai_insights;

use sqlx::postgres::PgArguments;
use sqlx::FromRow;

use crate::database::manager::DatabaseError;
use crate::filter::BindValue;

/// Bind filter-produced parameters in placeholder order.
pub(crate) fn bind_filter_params<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    params: &[BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    for value in params {
        q = match value {
            BindValue::Uuid(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.clone()),
        };
    }
    q
}

/// True when the error is a Postgres unique-constraint violation (23505).
pub fn is_unique_violation(err: &DatabaseError) -> bool {
    if let DatabaseError::Sqlx(sqlx::Error::Database(db_err)) = err {
        db_err.code().as_deref() == Some("23505")
    } else {
        false
    }
}
