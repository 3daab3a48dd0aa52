//! Mapping result export.
//!
//! Each [`rxmap_model::MappingRecord`] is flattened into one [`ExportRow`];
//! every export writes a fresh `<prefix>_<YYYYmmdd_HHMMSS>.csv`.

#![deny(unsafe_code)]

pub mod error;
pub mod export;
pub mod row;

pub use error::{ExportError, Result};
pub use export::{EXPORT_COLUMNS, export_file_name, export_results, read_results};
pub use row::ExportRow;
