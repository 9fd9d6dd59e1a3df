//! Spreadsheet export of one evaluation visit

use std::io::Cursor;
use std::str::FromStr;

use shared::{build_export_table, EvaluationVisit, ExportTable};

use crate::error::{AppError, AppResult};

const SHEET_NAME: &str = "Sheet1";

/// Download format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AppError::Validation {
                field: "format".to_string(),
                message: format!("Unsupported export format: {}", other),
                message_es: format!("Formato de exportación no soportado: {}", other),
            }),
        }
    }
}

/// An encoded export ready to download
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct ExportService;

impl ExportService {
    /// Encode one visit in the requested format
    pub fn export_visit(visit: &EvaluationVisit, format: ExportFormat) -> AppResult<ExportFile> {
        let table = build_export_table(visit, format.extension())?;
        let bytes = match format {
            ExportFormat::Xlsx => Self::to_xlsx(&table)?,
            ExportFormat::Csv => Self::to_csv(&table)?,
        };

        tracing::info!(
            "Exported evaluation {} as {} ({} rows)",
            visit.id,
            table.file_name,
            table.rows.len()
        );

        Ok(ExportFile {
            file_name: table.file_name,
            content_type: format.content_type(),
            bytes,
        })
    }

    /// Write the table to a single-sheet workbook, header in row 1
    pub fn to_xlsx(table: &ExportTable) -> AppResult<Vec<u8>> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_by_name_mut(SHEET_NAME)
            .ok_or_else(|| AppError::Internal("Workbook has no default sheet".to_string()))?;

        let lines = std::iter::once(&table.headers).chain(table.rows.iter());
        for (row_idx, line) in lines.enumerate() {
            for (col_idx, value) in line.iter().enumerate() {
                sheet
                    .get_cell_mut((col_idx as u32 + 1, row_idx as u32 + 1))
                    .set_value(value.clone());
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer)
            .map_err(|e| AppError::Internal(format!("XLSX writer error: {}", e)))?;
        Ok(buffer.into_inner())
    }

    pub fn to_csv(table: &ExportTable) -> AppResult<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&table.headers)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        for row in &table.rows {
            wtr.write_record(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))
    }
}
