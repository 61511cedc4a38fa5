//! `tablebook_io_xlsx` v1:
//! Rust-side XLSX writer kernel.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options/errors
//! - `util`   : pure helper functions
//! - `writer` : DataFrame-to-sheet writer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_header_format,
};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetReport, SpecXlsxSheetWriteOptions, SpecXlsxValuePolicy, SpecXlsxWriteOptions,
    XlsxWriteError,
};
pub use util::{
    calculate_column_width, convert_cell_value, format_float_text, measure_text_width,
    render_cell_text, sanitize_sheet_name, validate_policy_autofit,
};
pub use writer::XlsxWriter;
