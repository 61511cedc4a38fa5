//! `tablebook_export` v1:
//! Batch CSV-to-workbook exporter.
//!
//! - `conf`   : constants, built-in configuration, TOML loading
//! - `export` : workbook/sheet orchestration
//! - `report` : per-item events and run report
//! - `spec`   : configuration models and errors
//! - `util`   : sheet naming and CSV loading

pub mod conf;
pub mod export;
pub mod report;
pub mod spec;
mod util;

pub use conf::{
    derive_default_export_config, load_export_config, parse_export_config, render_export_config,
};
pub use export::export_workbooks;
pub use report::{EnumExportEvent, ReportExport, ReportExportBuilder};
pub use spec::{ExportError, SpecCsvReadOptions, SpecExportConfig, SpecWorkbookGroup};
pub use util::derive_sheet_name_from_csv;
