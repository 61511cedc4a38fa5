//! Command-line arguments and config resolution.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tablebook_export::{SpecExportConfig, derive_default_export_config, load_export_config};

/// Convert groups of CSV files into multi-sheet XLSX workbooks.
#[derive(Debug, Parser)]
#[command(name = "tablebook", version, about)]
pub struct Cli {
    /// TOML configuration file; the built-in workbook mapping is used when omitted.
    #[arg(short, long, value_name = "FILE", env = "TABLEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the source CSVs (overrides the config).
    #[arg(long, value_name = "DIR")]
    pub dir_source: Option<PathBuf>,

    /// Directory receiving the workbooks (overrides the config).
    #[arg(long, value_name = "DIR")]
    pub dir_output: Option<PathBuf>,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Build the export configuration: file or built-in default, then CLI overrides.
    pub fn resolve_config(&self) -> anyhow::Result<SpecExportConfig> {
        let mut config = match &self.config {
            Some(path) => load_export_config(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => derive_default_export_config(),
        };

        if let Some(dir) = &self.dir_source {
            config.dir_source = dir.clone();
        }
        if let Some(dir) = &self.dir_output {
            config.dir_output = Some(dir.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["tablebook"]).expect("parse");
        assert!(cli.config.is_none());
        assert!(!cli.print_config);

        let config = cli.resolve_config().expect("config");
        assert_eq!(config, derive_default_export_config());
    }

    #[test]
    fn test_overrides_apply_on_top_of_default() {
        let cli = Cli::try_parse_from([
            "tablebook",
            "--dir-source",
            "data/in",
            "--dir-output",
            "data/out",
        ])
        .expect("parse");

        let config = cli.resolve_config().expect("config");
        assert_eq!(config.dir_source, PathBuf::from("data/in"));
        assert_eq!(config.resolve_dir_output(), Path::new("data/out"));
        assert_eq!(config.workbooks.len(), 3);
    }

    #[test]
    fn test_config_file_is_loaded() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("tablebook.toml");
        std::fs::write(
            &path,
            "dir_source = \"csv\"\n\n[[workbooks]]\nname = \"Only.xlsx\"\ncsv_files = [\"a.csv\"]\n",
        )
        .expect("write config");

        let cli = Cli::try_parse_from(["tablebook", "--config", path.to_str().expect("utf8")])
            .expect("parse");
        let config = cli.resolve_config().expect("config");
        assert_eq!(config.dir_source, PathBuf::from("csv"));
        assert_eq!(config.workbooks.len(), 1);
        assert_eq!(config.workbooks[0].name, "Only.xlsx");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["tablebook", "-c", "/nonexistent/tablebook.toml"])
            .expect("parse");
        let err = cli.resolve_config().expect_err("missing file");
        assert!(format!("{err:#}").contains("loading configuration"));
    }
}
