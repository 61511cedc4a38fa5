//! XLSX writer kernel that converts in-memory DataFrames into workbook sheets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecCellFormat, SpecSheetReport,
    SpecXlsxSheetWriteOptions, SpecXlsxWriteOptions, XlsxWriteError,
};
use crate::util::{
    calculate_column_width, convert_cell_value, measure_text_width, render_cell_text,
    sanitize_sheet_name, validate_frame_limits, validate_policy_autofit, validate_unique_columns,
};

/// Stateful workbook writer.
///
/// The workbook is buffered in memory; nothing touches disk until
/// [`Self::close`] is called.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_header: Format,
    fmt_body: Option<Format>,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecSheetReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and header/body presets.
    pub fn new(
        path_file_out: PathBuf,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        let fmt_body = if write_options.fmt_body.is_empty() {
            None
        } else {
            Some(derive_rust_xlsx_format(&write_options.fmt_body))
        };
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_header: derive_rust_xlsx_format(&fmt_header),
            fmt_body,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecSheetReport> {
        self.l_reports.clone()
    }

    /// Number of sheets written so far.
    pub fn sheet_count(&self) -> usize {
        self.l_reports.len()
    }

    /// Flush workbook to disk. Idempotent.
    ///
    /// A workbook without sheets still saves: `rust_xlsxwriter` inserts one
    /// blank default worksheet.
    pub fn close(&mut self) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write one sheet from an in-memory dataframe.
    ///
    /// The header row comes from column names; the frame's row index is never
    /// written. `sheet_name` is normalized with [`sanitize_sheet_name`] and must
    /// not collide with a sheet already written.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecSheetReport, XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Closed);
        }
        validate_policy_autofit(&options.policy_autofit)?;

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();
        validate_frame_limits(n_height_df, n_width_df)?;

        let sheet_name_final = sanitize_sheet_name(sheet_name, "_");
        // Excel compares sheet names case-insensitively.
        let sheet_name_key = sheet_name_final.to_lowercase();
        if self.set_sheet_names_existing.contains(&sheet_name_key) {
            return Err(XlsxWriteError::DuplicateSheetName(sheet_name_final));
        }

        let policy_autofit = &options.policy_autofit;
        let if_autofit_header = matches!(
            policy_autofit.rule_columns,
            EnumAutofitColumnsRule::Header | EnumAutofitColumnsRule::All
        );
        let if_autofit_body = matches!(
            policy_autofit.rule_columns,
            EnumAutofitColumnsRule::Body | EnumAutofitColumnsRule::All
        );
        let n_rows_body_inferred = policy_autofit
            .height_body_inferred_max
            .map_or(n_height_df, |n_max| usize::min(n_max, n_height_df));

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_final)?;

        let mut l_width_by_col = vec![0usize; n_width_df];

        for (n_idx_col, c_colname) in l_colnames_df.iter().enumerate() {
            worksheet.write_string_with_format(
                0,
                cast_col_num(n_idx_col)?,
                c_colname,
                &self.fmt_header,
            )?;
            if if_autofit_header {
                l_width_by_col[n_idx_col] = measure_text_width(c_colname);
            }
        }

        let value_policy = &self.write_options.value_policy;
        for (n_idx_col, col) in df_data.get_columns().iter().enumerate() {
            for n_idx_row in 0..n_height_df {
                let value_raw = derive_cell_value_from_any_value(
                    col.get(n_idx_row)
                        .map_err(|err| XlsxWriteError::CellAccess(err.to_string()))?,
                );
                let value = convert_cell_value(&value_raw, value_policy);

                if if_autofit_body && n_idx_row < n_rows_body_inferred {
                    l_width_by_col[n_idx_col] = usize::max(
                        l_width_by_col[n_idx_col],
                        measure_text_width(&render_cell_text(&value)),
                    );
                }

                write_cell_with_format(
                    worksheet,
                    n_idx_row + 1,
                    n_idx_col,
                    &value,
                    self.fmt_body.as_ref(),
                )?;
            }
        }

        let mut l_widths_applied = Vec::new();
        if !matches!(policy_autofit.rule_columns, EnumAutofitColumnsRule::None) {
            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = calculate_column_width(*n_width_recorded, policy_autofit);
                worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
                l_widths_applied.push(n_width_final);
            }
        }

        self.set_sheet_names_existing.insert(sheet_name_key);
        let report = SpecSheetReport {
            sheet_name: sheet_name_final,
            n_rows_data: n_height_df,
            n_cols: n_width_df,
            widths_by_col: l_widths_applied,
        };
        debug!(
            sheet = %report.sheet_name,
            n_rows = report.n_rows_data,
            n_cols = report.n_cols,
            "sheet buffered"
        );
        self.l_reports.push(report.clone());
        Ok(report)
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::UInt64(val) => match i64::try_from(val) {
            Ok(n) => EnumCellValue::Integer(n),
            Err(_) => EnumCellValue::Float(val as f64),
        },
        AnyValue::Int32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int64(val) => EnumCellValue::Integer(val),
        AnyValue::Float32(val) => EnumCellValue::Float(f64::from(val)),
        AnyValue::Float64(val) => EnumCellValue::Float(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: Option<&Format>,
) -> Result<(), XlsxWriteError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match (value, format) {
        (EnumCellValue::None, Some(fmt)) => {
            worksheet.write_blank(n_row, n_col, fmt)?;
        }
        (EnumCellValue::None, None) => {}
        (EnumCellValue::String(val), Some(fmt)) => {
            worksheet.write_string_with_format(n_row, n_col, val, fmt)?;
        }
        (EnumCellValue::String(val), None) => {
            worksheet.write_string(n_row, n_col, val)?;
        }
        (EnumCellValue::Integer(val), Some(fmt)) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, fmt)?;
        }
        (EnumCellValue::Integer(val), None) => {
            worksheet.write_number(n_row, n_col, *val as f64)?;
        }
        (EnumCellValue::Float(val), Some(fmt)) => {
            worksheet.write_number_with_format(n_row, n_col, *val, fmt)?;
        }
        (EnumCellValue::Float(val), None) => {
            worksheet.write_number(n_row, n_col, *val)?;
        }
        (EnumCellValue::Boolean(val), Some(fmt)) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, fmt)?;
        }
        (EnumCellValue::Boolean(val), None) => {
            worksheet.write_boolean(n_row, n_col, *val)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxWriteError> {
    u32::try_from(value).map_err(|_| XlsxWriteError::IndexOverflow(format!("row {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxWriteError> {
    u16::try_from(value).map_err(|_| XlsxWriteError::IndexOverflow(format!("column {value}")))
}
