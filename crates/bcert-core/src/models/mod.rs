//! Data models: configuration, field records, and the result table.

pub mod config;
pub mod record;
pub mod table;

pub use config::BcertConfig;
pub use record::{FieldName, FieldRecord};
pub use table::ResultTable;
