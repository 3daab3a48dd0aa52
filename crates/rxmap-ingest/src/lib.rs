#![deny(unsafe_code)]

pub mod context;
pub mod table;

pub use context::{REQUIRED_COLUMNS, build_product_context, is_missing_marker};
pub use table::{IngestOptions, SourceRow, SourceTable, read_source_table};
