//! Tabular export of one evaluation visit
//!
//! Produces the header and string rows of the spreadsheet download. The
//! file encoding itself (xlsx, csv) is left to the caller.

use serde::Serialize;
use thiserror::Error;

use crate::models::{EvaluationVisit, PollinationObservation};
use crate::types::FieldValue;

/// Column headers, in sheet order
pub const EXPORT_HEADERS: [&str; 18] = [
    "Fecha",
    "Hora",
    "Semana",
    "Ubicación",
    "Lote",
    "Sección",
    "Palma",
    "Inflorescencia",
    "Antesis",
    "Antesis Dejadas",
    "Post Antesis",
    "Post Antesis Dejadas",
    "Espate",
    "Aplicación",
    "Marcación",
    "Repaso 1",
    "Repaso 2",
    "Observaciones",
];

const MISSING_TEXT: &str = "-";
const MISSING_COUNT: &str = "0";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Evaluation {0} has no observations to export")]
    NoData(String),
}

/// Header plus one row per exported observation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTable {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn text_cell(value: &Option<FieldValue>) -> String {
    match value {
        Some(v) if v.is_recorded() => v.to_text(),
        _ => MISSING_TEXT.to_string(),
    }
}

fn count_cell(value: &Option<FieldValue>) -> String {
    match value {
        Some(v) if v.is_recorded() => v.to_text(),
        _ => MISSING_COUNT.to_string(),
    }
}

fn observation_row(obs: &PollinationObservation) -> Vec<String> {
    vec![
        text_cell(&obs.date),
        text_cell(&obs.time),
        text_cell(&obs.week),
        text_cell(&obs.location),
        text_cell(&obs.lot),
        text_cell(&obs.section),
        text_cell(&obs.palm),
        count_cell(&obs.inflorescence),
        count_cell(&obs.antesis),
        count_cell(&obs.antesis_left),
        count_cell(&obs.post_antesis),
        count_cell(&obs.post_antesis_left),
        count_cell(&obs.emasculation),
        count_cell(&obs.application),
        count_cell(&obs.marking),
        count_cell(&obs.pass1),
        count_cell(&obs.pass2),
        obs.observations.clone().unwrap_or_default(),
    ]
}

/// The visit's own summary fields as a single row, dated like the visit
fn summary_observation(visit: &EvaluationVisit) -> PollinationObservation {
    let mut obs = visit.summary.clone();
    if obs.date.is_none() && !visit.date.trim().is_empty() {
        obs.date = Some(FieldValue::Text(visit.date.clone()));
    }
    if obs.time.is_none() {
        obs.time = visit.time.clone().map(FieldValue::Text);
    }
    obs
}

/// Download file name for a visit.
///
/// The name is quoted into a `Content-Disposition` header, so quotes and
/// control characters are dropped.
pub fn export_file_name(visit: &EvaluationVisit, extension: &str) -> String {
    let operator = visit.operator_name().unwrap_or("sin_polinizador");
    let raw = format!("evaluacion_{}_{}", operator, visit.date.trim());
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('-'),
            c if c.is_whitespace() => Some('_'),
            '"' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    format!("{}.{}", cleaned.trim_end_matches('_'), extension)
}

/// Build the export table of one visit.
///
/// A visit without observations exports its own summary fields as one row;
/// if those are empty too there is nothing to export.
pub fn build_export_table(
    visit: &EvaluationVisit,
    extension: &str,
) -> Result<ExportTable, ExportError> {
    let rows: Vec<Vec<String>> = if visit.details.is_empty() {
        if !visit.summary.has_entries() {
            return Err(ExportError::NoData(visit.id.clone()));
        }
        vec![observation_row(&summary_observation(visit))]
    } else {
        visit.details.iter().map(observation_row).collect()
    };

    Ok(ExportTable {
        file_name: export_file_name(visit, extension),
        headers: EXPORT_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_path_safe() {
        let visit = EvaluationVisit {
            date: "01/03/2024".to_string(),
            operator: Some("Ana María".to_string()),
            ..Default::default()
        };
        assert_eq!(
            export_file_name(&visit, "xlsx"),
            "evaluacion_Ana_María_01-03-2024.xlsx"
        );
    }

    #[test]
    fn test_file_name_drops_quotes_and_control_characters() {
        let visit = EvaluationVisit {
            date: "01/03/2024\u{7}".to_string(),
            operator: Some("Ana \"La\u{0} Jefa\"".to_string()),
            ..Default::default()
        };
        let name = export_file_name(&visit, "csv");
        assert_eq!(name, "evaluacion_Ana_La_Jefa_01-03-2024.csv");
        assert!(!name.chars().any(|c| c == '"' || c.is_control()));
    }

    #[test]
    fn test_missing_fields_render_defaults() {
        let row = observation_row(&PollinationObservation::default());
        assert_eq!(row.len(), EXPORT_HEADERS.len());
        assert_eq!(row[0], "-");
        assert_eq!(row[8], "0");
        assert_eq!(row[17], "");
    }
}
