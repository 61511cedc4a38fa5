//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_EXCEL_COLUMN_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecXlsxValuePolicy, XlsxWriteError,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Normalize a raw cell value according to the value policy.
///
/// Nulls and non-finite floats become their policy replacement text, or a
/// blank when the replacement is empty.
pub fn convert_cell_value(value: &EnumCellValue, value_policy: &SpecXlsxValuePolicy) -> EnumCellValue {
    match value {
        EnumCellValue::None => derive_replacement_value(&value_policy.missing_value_str),
        EnumCellValue::Float(n) if n.is_nan() => derive_replacement_value(&value_policy.nan_str),
        EnumCellValue::Float(n) if n.is_infinite() => {
            if n.is_sign_positive() {
                derive_replacement_value(&value_policy.posinf_str)
            } else {
                derive_replacement_value(&value_policy.neginf_str)
            }
        }
        _ => value.clone(),
    }
}

fn derive_replacement_value(replacement: &str) -> EnumCellValue {
    if replacement.is_empty() {
        EnumCellValue::None
    } else {
        EnumCellValue::String(replacement.to_string())
    }
}

/// Render a normalized cell value as display text.
///
/// Floats keep a fractional part (`1.0`) and switch to exponent form outside
/// `[1e-4, 1e16)`, booleans render as `True`/`False`.
pub fn render_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Integer(n) => n.to_string(),
        EnumCellValue::Float(n) => format_float_text(*n),
        EnumCellValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
    }
}

/// Format a float with shortest round-trip digits.
pub fn format_float_text(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x.is_sign_positive() { "inf" } else { "-inf" }.to_string();
    }

    let n_abs = x.abs();
    if n_abs != 0.0 && !(1e-4..1e16).contains(&n_abs) {
        let c_exp = format!("{x:e}");
        let Some((c_mantissa, c_exponent)) = c_exp.split_once('e') else {
            return c_exp;
        };
        let n_exponent: i32 = c_exponent.parse().unwrap_or(0);
        let c_sign = if n_exponent < 0 { '-' } else { '+' };
        return format!("{c_mantissa}e{c_sign}{:02}", n_exponent.abs());
    }

    if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

/// Display length of text in characters.
pub fn measure_text_width(text: &str) -> usize {
    text.chars().count()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), XlsxWriteError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxWriteError::DuplicateColumns(c_msg))
}

/// Reject frames that cannot fit a single worksheet (header row included).
pub fn validate_frame_limits(height_df: usize, width_df: usize) -> Result<(), XlsxWriteError> {
    if width_df > N_NCOLS_EXCEL_MAX {
        return Err(XlsxWriteError::ExcelLimit(format!(
            "{width_df} columns > {N_NCOLS_EXCEL_MAX}"
        )));
    }
    if height_df + 1 > N_NROWS_EXCEL_MAX {
        return Err(XlsxWriteError::ExcelLimit(format!(
            "{height_df} data rows + header > {N_NROWS_EXCEL_MAX}"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Validate autofit bounds.
pub fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxWriteError> {
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxWriteError::InvalidPolicy(
            "width_cell_max must be >= width_cell_min".to_string(),
        ));
    }
    if policy_autofit.width_cell_max > N_WIDTH_EXCEL_COLUMN_MAX {
        return Err(XlsxWriteError::InvalidPolicy(format!(
            "width_cell_max must be <= {N_WIDTH_EXCEL_COLUMN_MAX}"
        )));
    }
    Ok(())
}

/// Final column width: recorded text width plus padding, clamped to policy bounds.
pub fn calculate_column_width(n_width_recorded: usize, policy_autofit: &SpecAutofitCellsPolicy) -> usize {
    let n_width_padded = n_width_recorded + policy_autofit.width_cell_padding;
    n_width_padded.clamp(policy_autofit.width_cell_min, policy_autofit.width_cell_max)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_text_mimics_python_str() {
        assert_eq!(format_float_text(1.0), "1.0");
        assert_eq!(format_float_text(0.0), "0.0");
        assert_eq!(format_float_text(-2.5), "-2.5");
        assert_eq!(format_float_text(0.1), "0.1");
        assert_eq!(format_float_text(123.456), "123.456");
        assert_eq!(format_float_text(1e16), "1e+16");
        assert_eq!(format_float_text(1.5e-5), "1.5e-05");
        assert_eq!(format_float_text(-2.25e20), "-2.25e+20");
        assert_eq!(format_float_text(f64::NAN), "nan");
        assert_eq!(format_float_text(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_render_cell_text_by_variant() {
        assert_eq!(render_cell_text(&EnumCellValue::None), "");
        assert_eq!(render_cell_text(&EnumCellValue::Integer(-42)), "-42");
        assert_eq!(render_cell_text(&EnumCellValue::Float(3.0)), "3.0");
        assert_eq!(render_cell_text(&EnumCellValue::Boolean(true)), "True");
        assert_eq!(render_cell_text(&EnumCellValue::Boolean(false)), "False");
        assert_eq!(
            render_cell_text(&EnumCellValue::String("Prime Sedan".to_string())),
            "Prime Sedan"
        );
    }

    #[test]
    fn test_convert_cell_value_applies_policy() {
        let policy = SpecXlsxValuePolicy::default();
        assert_eq!(convert_cell_value(&EnumCellValue::None, &policy), EnumCellValue::None);
        assert_eq!(
            convert_cell_value(&EnumCellValue::Float(f64::NAN), &policy),
            EnumCellValue::None
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::Float(f64::INFINITY), &policy),
            EnumCellValue::String("inf".to_string())
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::Float(f64::NEG_INFINITY), &policy),
            EnumCellValue::String("-inf".to_string())
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::Float(2.5), &policy),
            EnumCellValue::Float(2.5)
        );

        let policy_na = SpecXlsxValuePolicy {
            missing_value_str: "NA".to_string(),
            ..SpecXlsxValuePolicy::default()
        };
        assert_eq!(
            convert_cell_value(&EnumCellValue::None, &policy_na),
            EnumCellValue::String("NA".to_string())
        );
    }

    #[test]
    fn test_measure_text_width_counts_chars_not_bytes() {
        assert_eq!(measure_text_width(""), 0);
        assert_eq!(measure_text_width("abc"), 3);
        assert_eq!(measure_text_width("café"), 4);
        assert_eq!(measure_text_width("₹ 1200"), 6);
    }

    #[test]
    fn test_calculate_column_width_pads_and_clamps() {
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(calculate_column_width(2, &policy), 4);
        assert_eq!(calculate_column_width(0, &policy), 2);
        assert_eq!(calculate_column_width(400, &policy), 255);

        let policy_min = SpecAutofitCellsPolicy {
            width_cell_min: 8,
            ..SpecAutofitCellsPolicy::default()
        };
        assert_eq!(calculate_column_width(2, &policy_min), 8);
    }

    #[test]
    fn test_validate_policy_autofit_rejects_inverted_bounds() {
        let policy = SpecAutofitCellsPolicy {
            width_cell_min: 10,
            width_cell_max: 5,
            ..SpecAutofitCellsPolicy::default()
        };
        assert!(matches!(
            validate_policy_autofit(&policy),
            Err(XlsxWriteError::InvalidPolicy(_))
        ));
        assert!(validate_policy_autofit(&SpecAutofitCellsPolicy::default()).is_ok());
    }

    #[test]
    fn test_sanitize_sheet_name_truncates_and_replaces() {
        assert_eq!(sanitize_sheet_name("completion_rate", "_"), "completion_rate");
        assert_eq!(
            sanitize_sheet_name("top_reasons_for_incomplete_bookings", "_"),
            "top_reasons_for_incomplete_book"
        );
        assert_eq!(sanitize_sheet_name("a/b[1]", "_"), "a_b_1_");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
    }

    #[test]
    fn test_validate_unique_columns_reports_positions() {
        assert!(validate_unique_columns(&["a".to_string(), "b".to_string()]).is_ok());
        let err = validate_unique_columns(&["a".to_string(), "b".to_string(), "a".to_string()])
            .expect_err("duplicate");
        assert_eq!(
            err.to_string(),
            "duplicate column names detected: \"a\" x2 at indices [0, 2]"
        );
    }

    #[test]
    fn test_validate_frame_limits() {
        assert!(validate_frame_limits(N_NROWS_EXCEL_MAX - 1, 10).is_ok());
        assert!(validate_frame_limits(N_NROWS_EXCEL_MAX, 10).is_err());
        assert!(validate_frame_limits(10, N_NCOLS_EXCEL_MAX + 1).is_err());
    }
}
