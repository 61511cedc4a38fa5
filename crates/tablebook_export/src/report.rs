//! Export events, report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tablebook_io_xlsx::SpecSheetReport;

/// One per-item outcome of an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumExportEvent {
    /// Listed CSV does not exist; omitted from its workbook.
    FileNotFound {
        /// Workbook the CSV was listed for.
        workbook: String,
        /// CSV name as configured.
        csv_file: String,
    },
    /// CSV parsed to zero data rows; omitted from its workbook.
    EmptyFileSkipped {
        /// Workbook the CSV was listed for.
        workbook: String,
        /// CSV name as configured.
        csv_file: String,
    },
    /// CSV written as a sheet.
    SheetWritten {
        /// Target workbook.
        workbook: String,
        /// Source CSV name.
        csv_file: String,
        /// Kernel report for the sheet.
        sheet: SpecSheetReport,
    },
    /// Workbook file saved.
    WorkbookCreated {
        /// Workbook name.
        workbook: String,
        /// Saved file path.
        path: PathBuf,
        /// Sheets written from CSVs (a default blank sheet is not counted).
        n_sheets: usize,
    },
}

impl EnumExportEvent {
    /// Workbook this event belongs to.
    pub fn workbook(&self) -> &str {
        match self {
            Self::FileNotFound { workbook, .. }
            | Self::EmptyFileSkipped { workbook, .. }
            | Self::SheetWritten { workbook, .. }
            | Self::WorkbookCreated { workbook, .. } => workbook,
        }
    }

    /// Whether the event is a skip warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::EmptyFileSkipped { .. }
        )
    }
}

impl fmt::Display for EnumExportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { csv_file, .. } => write!(f, "⚠️ File not found: {csv_file}"),
            Self::EmptyFileSkipped { csv_file, .. } => {
                write!(f, "⚠️ Empty file skipped: {csv_file}")
            }
            Self::SheetWritten { csv_file, sheet, .. } => write!(
                f,
                "Wrote sheet {} from {csv_file} ({} rows, {} columns)",
                sheet.sheet_name, sheet.n_rows_data, sheet.n_cols
            ),
            Self::WorkbookCreated { path, .. } => {
                write!(f, "✅ Created Excel file: {}", path.display())
            }
        }
    }
}

/// Aggregate counters and ordered events for one export run.
#[derive(Debug, Default, Clone)]
pub struct ReportExport {
    /// Workbooks saved.
    pub cnt_workbooks: u64,
    /// Sheets written across all workbooks.
    pub cnt_sheets: u64,
    /// Listed CSVs that did not exist.
    pub cnt_missing: u64,
    /// Listed CSVs skipped for having no data rows.
    pub cnt_empty: u64,
    /// Every event in emission order.
    pub events: Vec<EnumExportEvent>,
}

impl ReportExport {
    /// Number of skip warnings.
    pub fn warning_count(&self) -> usize {
        self.events.iter().filter(|event| event.is_warning()).count()
    }

    /// Sheet reports written into `workbook`, in order.
    pub fn sheets_of(&self, workbook: &str) -> Vec<&SpecSheetReport> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EnumExportEvent::SheetWritten {
                    workbook: c_workbook,
                    sheet,
                    ..
                } if c_workbook == workbook => Some(sheet),
                _ => None,
            })
            .collect()
    }

    /// Events belonging to `workbook`, in order.
    pub fn events_of<'a>(&'a self, workbook: &'a str) -> impl Iterator<Item = &'a EnumExportEvent> {
        self.events
            .iter()
            .filter(move |event| event.workbook() == workbook)
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_workbooks".to_string(), self.cnt_workbooks);
        dict_counts.insert("cnt_sheets".to_string(), self.cnt_sheets);
        dict_counts.insert("cnt_missing".to_string(), self.cnt_missing);
        dict_counts.insert("cnt_empty".to_string(), self.cnt_empty);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} workbooks={} sheets={} missing={} empty={}",
            self.cnt_workbooks, self.cnt_sheets, self.cnt_missing, self.cnt_empty
        )
    }
}

impl fmt::Display for ReportExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXPORT]"))
    }
}

/// Mutable accumulator for export events.
#[derive(Debug, Default, Clone)]
pub struct ReportExportBuilder {
    report: ReportExport,
}

impl ReportExportBuilder {
    /// Record one event and bump the matching counter.
    pub fn add_event(&mut self, event: EnumExportEvent) {
        match &event {
            EnumExportEvent::FileNotFound { .. } => self.report.cnt_missing += 1,
            EnumExportEvent::EmptyFileSkipped { .. } => self.report.cnt_empty += 1,
            EnumExportEvent::SheetWritten { .. } => self.report.cnt_sheets += 1,
            EnumExportEvent::WorkbookCreated { .. } => self.report.cnt_workbooks += 1,
        }
        self.report.events.push(event);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportExport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str) -> SpecSheetReport {
        SpecSheetReport {
            sheet_name: name.to_string(),
            n_rows_data: 2,
            n_cols: 2,
            widths_by_col: vec![4, 4],
        }
    }

    #[test]
    fn test_event_display_matches_console_lines() {
        let event = EnumExportEvent::FileNotFound {
            workbook: "W.xlsx".to_string(),
            csv_file: "a.csv".to_string(),
        };
        assert_eq!(event.to_string(), "⚠️ File not found: a.csv");

        let event = EnumExportEvent::EmptyFileSkipped {
            workbook: "W.xlsx".to_string(),
            csv_file: "b.csv".to_string(),
        };
        assert_eq!(event.to_string(), "⚠️ Empty file skipped: b.csv");

        let event = EnumExportEvent::WorkbookCreated {
            workbook: "W.xlsx".to_string(),
            path: PathBuf::from("Tables/W.xlsx"),
            n_sheets: 0,
        };
        assert_eq!(event.to_string(), "✅ Created Excel file: Tables/W.xlsx");
    }

    #[test]
    fn test_builder_counts_and_summarizes() {
        let mut builder = ReportExportBuilder::default();
        builder.add_event(EnumExportEvent::FileNotFound {
            workbook: "W.xlsx".to_string(),
            csv_file: "x.csv".to_string(),
        });
        builder.add_event(EnumExportEvent::SheetWritten {
            workbook: "W.xlsx".to_string(),
            csv_file: "a.csv".to_string(),
            sheet: sheet("a"),
        });
        builder.add_event(EnumExportEvent::SheetWritten {
            workbook: "V.xlsx".to_string(),
            csv_file: "c.csv".to_string(),
            sheet: sheet("c"),
        });
        builder.add_event(EnumExportEvent::WorkbookCreated {
            workbook: "W.xlsx".to_string(),
            path: PathBuf::from("W.xlsx"),
            n_sheets: 1,
        });

        let report = builder.build();
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.sheets_of("W.xlsx"), vec![&sheet("a")]);
        assert_eq!(report.events_of("V.xlsx").count(), 1);

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_sheets"], 2);
        assert_eq!(dict_counts["cnt_missing"], 1);
        assert_eq!(
            report.to_string(),
            "[EXPORT] workbooks=1 sheets=2 missing=1 empty=0"
        );
    }
}
