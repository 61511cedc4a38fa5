//! Shared helpers: sheet naming and CSV loading.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, PolarsError, SerReader};
use tablebook_io_xlsx::sanitize_sheet_name;

use crate::spec::{ExportError, SpecCsvReadOptions};

/// Sheet name for a CSV: base name without extension, normalized and
/// truncated to the Excel limit of 31 characters.
pub fn derive_sheet_name_from_csv(csv_file: &str) -> String {
    let c_stem = Path::new(csv_file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| csv_file.to_string());
    sanitize_sheet_name(&c_stem, "_")
}

/// Parse one CSV file into a DataFrame.
///
/// Any loader failure is returned as [`ExportError::CsvParse`] carrying the path.
pub fn read_csv_dataframe(
    path_csv: &Path,
    csv_options: &SpecCsvReadOptions,
    separator: u8,
) -> Result<DataFrame, ExportError> {
    let derive_error = |err: PolarsError| ExportError::CsvParse {
        path: path_csv.to_path_buf(),
        message: err.to_string(),
    };

    CsvReadOptions::default()
        .with_has_header(csv_options.has_header)
        .with_infer_schema_length(csv_options.infer_schema_length)
        .map_parse_options(|parse_options| parse_options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path_csv.to_path_buf()))
        .map_err(derive_error)?
        .finish()
        .map_err(derive_error)
}
