//! Export constants, the built-in configuration and TOML loading.

use std::fs;
use std::path::Path;

use crate::spec::{ExportError, SpecExportConfig, SpecWorkbookGroup};

/// Required workbook extension (compared case-insensitively).
pub const C_EXT_WORKBOOK: &str = ".xlsx";
/// Source folder of the built-in configuration.
pub const C_DIR_SOURCE_DEFAULT: &str = "Tables";

/// Built-in configuration: the ride-booking insight workbooks.
pub fn derive_default_export_config() -> SpecExportConfig {
    SpecExportConfig::new(
        C_DIR_SOURCE_DEFAULT,
        vec![
            SpecWorkbookGroup::new(
                "Operational_Efficiency_Insights.xlsx",
                [
                    "average_VTAT_and_CTAT.csv",
                    "highest_ride_completion.csv",
                    "percentageOfIncompleteBookings.csv",
                    "top_reasons_for_incomplete_bookings.csv",
                    "routes_with_higher_cancellation_rates.csv",
                ],
            ),
            SpecWorkbookGroup::new(
                "Financial_Insights.xlsx",
                [
                    "vehicle_revenue_summary.csv",
                    "avg_booking_value_per_vehicle.csv",
                    "estimated_revenue_loss_view.csv",
                    "revenue_per_km_per_route.csv",
                    "revenue_per_km_per_vehicle.csv",
                    "Average_Booking_Value_by_Payment_Method.csv",
                ],
            ),
            SpecWorkbookGroup::new(
                "Customer_Behavior_and_Satisfaction.xlsx",
                [
                    "highest_ride_requests.csv",
                    "completion_rate.csv",
                    "most_frequent_route.csv",
                    "highest_revenue.csv",
                    "poor_customer_rating.csv",
                    "poor_driver_rating.csv",
                ],
            ),
        ],
    )
}

/// Parse a TOML document into [`SpecExportConfig`].
///
/// `path` is only used for error messages.
pub fn parse_export_config(content: &str, path: &Path) -> Result<SpecExportConfig, ExportError> {
    toml::from_str(content).map_err(|err| ExportError::ConfigParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Load configuration from a TOML file.
pub fn load_export_config(path: &Path) -> Result<SpecExportConfig, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_export_config(&content, path)
}

/// Render configuration as TOML.
pub fn render_export_config(config: &SpecExportConfig) -> Result<String, ExportError> {
    toml::to_string_pretty(config).map_err(|err| ExportError::ConfigSerialize(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tablebook_io_xlsx::EnumAutofitColumnsRule;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config_is_valid_and_ordered() {
        let config = derive_default_export_config();
        config.validate().expect("valid");

        let l_names: Vec<&str> = config.workbooks.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            l_names,
            vec![
                "Operational_Efficiency_Insights.xlsx",
                "Financial_Insights.xlsx",
                "Customer_Behavior_and_Satisfaction.xlsx",
            ]
        );
        assert_eq!(config.workbooks[1].csv_files.len(), 6);
        assert_eq!(config.resolve_dir_output(), Path::new("Tables"));
    }

    #[test]
    fn test_parse_minimal_toml_fills_defaults() {
        let content = r#"
dir_source = "data"

[[workbooks]]
name = "W.xlsx"
csv_files = ["a.csv", "b.csv"]
"#;
        let config = parse_export_config(content, Path::new("t.toml")).expect("parse");
        assert_eq!(config.dir_source, PathBuf::from("data"));
        assert_eq!(config.dir_output, None);
        assert_eq!(config.csv.separator, ',');
        assert_eq!(config.autofit.width_cell_padding, 2);
        assert_eq!(config.autofit.rule_columns, EnumAutofitColumnsRule::All);
        assert_eq!(config.fmt_header.bold, Some(true));
        assert!(config.fmt_body.is_empty());
        assert_eq!(
            config.workbooks,
            vec![SpecWorkbookGroup::new("W.xlsx", ["a.csv", "b.csv"])]
        );
    }

    #[test]
    fn test_parse_overrides_nested_sections() {
        let content = r##"
dir_source = "data"
dir_output = "out"

[csv]
separator = ";"
infer_schema_length = 10

[autofit]
rule_columns = "header"
width_cell_padding = 4

[fmt_body]
num_format = "#,##0.00"
align = "right"
"##;
        let config = parse_export_config(content, Path::new("t.toml")).expect("parse");
        assert_eq!(config.dir_output, Some(PathBuf::from("out")));
        assert_eq!(config.csv.separator, ';');
        assert!(config.csv.has_header);
        assert_eq!(config.csv.infer_schema_length, Some(10));
        assert_eq!(config.autofit.rule_columns, EnumAutofitColumnsRule::Header);
        assert_eq!(config.autofit.width_cell_padding, 4);
        assert_eq!(config.autofit.width_cell_max, 255);
        assert_eq!(config.fmt_body.num_format.as_deref(), Some("#,##0.00"));
        assert_eq!(config.fmt_body.align.as_deref(), Some("right"));
        assert_eq!(config.fmt_header.bold, Some(true));
        assert!(config.workbooks.is_empty());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = parse_export_config("workbooks = 3", Path::new("bad.toml")).expect_err("bad");
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_rendered_default_config_parses_back() {
        let config = derive_default_export_config();
        let content = render_export_config(&config).expect("render");
        let config_back = parse_export_config(&content, Path::new("t.toml")).expect("parse");
        assert_eq!(config_back, config);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let err = load_export_config(&tmp.path().join("absent.toml")).expect_err("missing");
        assert!(matches!(err, ExportError::ConfigRead { .. }));
    }
}
