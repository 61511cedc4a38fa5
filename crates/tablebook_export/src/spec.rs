//! Export configuration models and top-level error types.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tablebook_io_xlsx::{
    SpecAutofitCellsPolicy, SpecCellFormat, SpecXlsxValuePolicy, XlsxWriteError,
    derive_default_header_format, validate_policy_autofit,
};
use thiserror::Error;

use crate::conf::C_EXT_WORKBOOK;
use crate::util::derive_sheet_name_from_csv;

////////////////////////////////////////////////////////////////////////////////
// #region ConfigModels

/// One output workbook and the CSVs that become its sheets, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecWorkbookGroup {
    /// Output file name, e.g. `Financial_Insights.xlsx`.
    pub name: String,
    /// Source CSV file names relative to the source directory.
    #[serde(default)]
    pub csv_files: Vec<String>,
}

impl SpecWorkbookGroup {
    /// Build a group from a name and CSV list.
    pub fn new<I, S>(name: impl Into<String>, csv_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            csv_files: csv_files.into_iter().map(Into::into).collect(),
        }
    }
}

/// CSV parsing options handed to polars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCsvReadOptions {
    /// Field separator; must be a single ASCII character.
    pub separator: char,
    /// First line holds column names.
    pub has_header: bool,
    /// Rows sampled for dtype inference; `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
}

impl Default for SpecCsvReadOptions {
    fn default() -> Self {
        Self {
            separator: ',',
            has_header: true,
            infer_schema_length: Some(100),
        }
    }
}

/// Full exporter configuration, passed explicitly into
/// [`crate::export::export_workbooks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecExportConfig {
    /// Directory holding the source CSVs.
    pub dir_source: PathBuf,
    /// Directory receiving the workbooks; defaults to `dir_source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_output: Option<PathBuf>,
    /// CSV parsing options.
    #[serde(default)]
    pub csv: SpecCsvReadOptions,
    /// Column width policy.
    #[serde(default)]
    pub autofit: SpecAutofitCellsPolicy,
    /// Missing/NaN/Inf rendering.
    #[serde(default)]
    pub value_policy: SpecXlsxValuePolicy,
    /// Header row format.
    #[serde(default = "derive_default_header_format")]
    pub fmt_header: SpecCellFormat,
    /// Body cell format; empty leaves body cells unformatted.
    #[serde(default, skip_serializing_if = "SpecCellFormat::is_empty")]
    pub fmt_body: SpecCellFormat,
    /// Workbooks in processing order.
    #[serde(default)]
    pub workbooks: Vec<SpecWorkbookGroup>,
}

impl SpecExportConfig {
    /// Config over `dir_source` with default options and the given workbooks.
    pub fn new(dir_source: impl Into<PathBuf>, workbooks: Vec<SpecWorkbookGroup>) -> Self {
        Self {
            dir_source: dir_source.into(),
            dir_output: None,
            csv: SpecCsvReadOptions::default(),
            autofit: SpecAutofitCellsPolicy::default(),
            value_policy: SpecXlsxValuePolicy::default(),
            fmt_header: derive_default_header_format(),
            fmt_body: SpecCellFormat::default(),
            workbooks,
        }
    }

    /// Directory where workbooks are written.
    pub fn resolve_dir_output(&self) -> &Path {
        self.dir_output.as_deref().unwrap_or(&self.dir_source)
    }

    /// Separator as the byte polars expects.
    pub fn separator_byte(&self) -> Result<u8, ExportError> {
        let chr = self.csv.separator;
        if !chr.is_ascii() {
            return Err(ExportError::InvalidConfig(format!(
                "csv.separator must be a single ASCII character, got {chr:?}"
            )));
        }
        Ok(chr as u8)
    }

    /// Check the configuration before any file is touched.
    ///
    /// Two CSVs of one workbook that normalize to the same sheet name
    /// (compared case-insensitively, as Excel does) are rejected here instead
    /// of being renamed.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.dir_source.as_os_str().is_empty() {
            return Err(ExportError::InvalidConfig(
                "dir_source must not be empty".to_string(),
            ));
        }
        self.separator_byte()?;
        validate_policy_autofit(&self.autofit)
            .map_err(|err| ExportError::InvalidConfig(format!("autofit: {err}")))?;

        let mut set_workbook_names = BTreeSet::new();
        for group in &self.workbooks {
            let c_name = group.name.as_str();
            if c_name.trim().is_empty() {
                return Err(ExportError::InvalidConfig(
                    "workbook name must not be empty".to_string(),
                ));
            }
            if c_name.trim() != c_name {
                return Err(ExportError::InvalidConfig(format!(
                    "workbook name {c_name:?} has leading or trailing whitespace"
                )));
            }
            if !c_name.to_ascii_lowercase().ends_with(C_EXT_WORKBOOK) {
                return Err(ExportError::InvalidConfig(format!(
                    "workbook name {c_name:?} must end with {C_EXT_WORKBOOK}"
                )));
            }
            if !set_workbook_names.insert(c_name.to_ascii_lowercase()) {
                return Err(ExportError::InvalidConfig(format!(
                    "workbook {c_name:?} is listed more than once"
                )));
            }

            let mut dict_sheet_owner: BTreeMap<String, &str> = BTreeMap::new();
            for csv_file in &group.csv_files {
                let sheet_name = derive_sheet_name_from_csv(csv_file);
                let sheet_name_key = sheet_name.to_lowercase();
                if let Some(csv_file_first) = dict_sheet_owner.get(&sheet_name_key) {
                    return Err(ExportError::SheetNameCollision {
                        workbook: group.name.clone(),
                        sheet_name,
                        csv_files: vec![csv_file_first.to_string(), csv_file.clone()],
                    });
                }
                dict_sheet_owner.insert(sheet_name_key, csv_file);
            }
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal errors: each one aborts the remaining run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Two CSVs of one workbook map to the same sheet name.
    #[error(
        "sheet name {sheet_name:?} in {workbook} would be produced by several CSVs: {}",
        csv_files.join(", ")
    )]
    SheetNameCollision {
        /// Workbook holding the colliding CSVs.
        workbook: String,
        /// Normalized sheet name both CSVs map to.
        sheet_name: String,
        /// The colliding CSV names, in listing order.
        csv_files: Vec<String>,
    },
    /// Config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Config file is not valid TOML for [`SpecExportConfig`].
    #[error("failed to parse config {}: {message}", path.display())]
    ConfigParse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// Config could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(String),
    /// Output directory could not be created.
    #[error("failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        /// Output directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// An existing CSV could not be parsed.
    #[error("failed to parse CSV {}: {message}", path.display())]
    CsvParse {
        /// Offending CSV file.
        path: PathBuf,
        /// Loader message.
        message: String,
    },
    /// Sheet or workbook write failed.
    #[error("failed to write workbook {}: {source}", path.display())]
    WorkbookWrite {
        /// Workbook output path.
        path: PathBuf,
        /// Kernel error.
        #[source]
        source: XlsxWriteError,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
