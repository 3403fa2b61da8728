pub mod types;
pub mod builder;
pub mod error;

pub use builder::RecordFilter;
pub use error::FilterError;
pub use types::{BindValue, FamilyScope, ListQuery, SqlResult};
