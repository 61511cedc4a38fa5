//! Workbook export orchestration: one workbook at a time, one sheet per CSV.

use std::fs;
use std::path::Path;

use tablebook_io_xlsx::{SpecXlsxSheetWriteOptions, SpecXlsxWriteOptions, XlsxWriter};
use tracing::{debug, info, warn};

use crate::report::{EnumExportEvent, ReportExport, ReportExportBuilder};
use crate::spec::{ExportError, SpecExportConfig, SpecWorkbookGroup};
use crate::util::{derive_sheet_name_from_csv, read_csv_dataframe};

/// Export every configured workbook.
///
/// For each workbook, in configuration order:
/// 1. Each listed CSV is resolved against `dir_source`.
/// 2. Missing CSVs and CSVs without data rows are logged and skipped.
/// 3. Remaining CSVs become one sheet each, named after the file stem
///    (max 31 chars), with autofit column widths.
/// 4. The workbook is saved before the next one starts, even when no sheet
///    was written.
///
/// Returns [`ReportExport`] with every per-item event. A CSV parse failure or
/// a write failure aborts the run with [`ExportError`]; workbooks saved
/// earlier stay on disk, the one in progress is not saved.
pub fn export_workbooks(config: &SpecExportConfig) -> Result<ReportExport, ExportError> {
    config.validate()?;

    let path_dir_output = config.resolve_dir_output();
    fs::create_dir_all(path_dir_output).map_err(|source| ExportError::OutputDir {
        path: path_dir_output.to_path_buf(),
        source,
    })?;

    let mut builder_report = ReportExportBuilder::default();
    for group in &config.workbooks {
        export_workbook(config, group, path_dir_output, &mut builder_report)?;
    }

    let report = builder_report.build();
    info!(
        n_workbooks = report.cnt_workbooks,
        n_sheets = report.cnt_sheets,
        "{report}"
    );
    Ok(report)
}

fn export_workbook(
    config: &SpecExportConfig,
    group: &SpecWorkbookGroup,
    path_dir_output: &Path,
    builder_report: &mut ReportExportBuilder,
) -> Result<(), ExportError> {
    let path_file_out = path_dir_output.join(&group.name);
    let n_separator = config.separator_byte()?;
    let write_options = SpecXlsxWriteOptions {
        value_policy: config.value_policy.clone(),
        fmt_body: config.fmt_body.clone(),
    };
    let sheet_options = SpecXlsxSheetWriteOptions {
        policy_autofit: config.autofit.clone(),
    };

    let mut writer = XlsxWriter::new(
        path_file_out.clone(),
        config.fmt_header.clone(),
        write_options,
    );
    debug!(workbook = %group.name, n_csv = group.csv_files.len(), "workbook started");

    for csv_file in &group.csv_files {
        let path_csv = config.dir_source.join(csv_file);
        if !path_csv.exists() {
            emit_event(
                builder_report,
                EnumExportEvent::FileNotFound {
                    workbook: group.name.clone(),
                    csv_file: csv_file.clone(),
                },
            );
            continue;
        }

        let df = read_csv_dataframe(&path_csv, &config.csv, n_separator)?;
        if df.height() == 0 {
            emit_event(
                builder_report,
                EnumExportEvent::EmptyFileSkipped {
                    workbook: group.name.clone(),
                    csv_file: csv_file.clone(),
                },
            );
            continue;
        }

        let sheet_name = derive_sheet_name_from_csv(csv_file);
        let sheet = writer
            .write_sheet(&df, &sheet_name, &sheet_options)
            .map_err(|source| ExportError::WorkbookWrite {
                path: path_file_out.clone(),
                source,
            })?;
        emit_event(
            builder_report,
            EnumExportEvent::SheetWritten {
                workbook: group.name.clone(),
                csv_file: csv_file.clone(),
                sheet,
            },
        );
    }

    writer
        .close()
        .map_err(|source| ExportError::WorkbookWrite {
            path: path_file_out.clone(),
            source,
        })?;
    emit_event(
        builder_report,
        EnumExportEvent::WorkbookCreated {
            workbook: group.name.clone(),
            path: path_file_out,
            n_sheets: writer.sheet_count(),
        },
    );
    Ok(())
}

fn emit_event(builder_report: &mut ReportExportBuilder, event: EnumExportEvent) {
    match &event {
        EnumExportEvent::FileNotFound { workbook, csv_file }
        | EnumExportEvent::EmptyFileSkipped { workbook, csv_file } => {
            warn!(workbook = %workbook, csv_file = %csv_file, "{event}");
        }
        EnumExportEvent::SheetWritten {
            workbook,
            csv_file,
            sheet,
        } => {
            debug!(
                workbook = %workbook,
                csv_file = %csv_file,
                sheet = %sheet.sheet_name,
                n_rows = sheet.n_rows_data,
                "{event}"
            );
        }
        EnumExportEvent::WorkbookCreated {
            workbook, n_sheets, ..
        } => {
            info!(workbook = %workbook, n_sheets = *n_sheets, "{event}");
        }
    }
    builder_report.add_event(event);
}
