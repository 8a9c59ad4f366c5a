// SQLite quota ledger
// Usage rows are audit data: they are only ever incremented, never deleted

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{Admission, LimitRecord, QuotaRecord};
pub use schema::SCHEMA_VERSION;
