mod error;
mod schema;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use schema::{member_table_schema, ColumnDef, ColumnType, TableId, TableSchema};
pub use traits::{ObjectStore, ReferenceSource, TableBackend};
pub use types::{InsertReport, ObjectRef, RowFailure};
