//! Pollination evaluation models

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{deserialize_id, deserialize_opt_text, is_recorded, FieldValue};

/// One sampled palm during an evaluation visit
///
/// Count fields keep their raw upstream shape; see [`FieldValue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollinationObservation {
    #[serde(alias = "fecha", skip_serializing_if = "Option::is_none")]
    pub date: Option<FieldValue>,
    #[serde(alias = "hora", skip_serializing_if = "Option::is_none")]
    pub time: Option<FieldValue>,
    #[serde(alias = "semana", skip_serializing_if = "Option::is_none")]
    pub week: Option<FieldValue>,
    #[serde(alias = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<FieldValue>,
    #[serde(alias = "lote", skip_serializing_if = "Option::is_none")]
    pub lot: Option<FieldValue>,
    #[serde(alias = "seccion", skip_serializing_if = "Option::is_none")]
    pub section: Option<FieldValue>,
    #[serde(alias = "palma", skip_serializing_if = "Option::is_none")]
    pub palm: Option<FieldValue>,

    #[serde(alias = "inflorescencia", skip_serializing_if = "Option::is_none")]
    pub inflorescence: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antesis: Option<FieldValue>,
    #[serde(alias = "antesisDejadas", skip_serializing_if = "Option::is_none")]
    pub antesis_left: Option<FieldValue>,
    #[serde(alias = "postantesis", skip_serializing_if = "Option::is_none")]
    pub post_antesis: Option<FieldValue>,
    #[serde(
        alias = "postAntesisDejadas",
        alias = "postantesisDejadas",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_antesis_left: Option<FieldValue>,
    /// Espate
    #[serde(alias = "espate", skip_serializing_if = "Option::is_none")]
    pub emasculation: Option<FieldValue>,
    #[serde(alias = "aplicacion", skip_serializing_if = "Option::is_none")]
    pub application: Option<FieldValue>,
    #[serde(alias = "marcacion", skip_serializing_if = "Option::is_none")]
    pub marking: Option<FieldValue>,
    /// Repaso 1
    #[serde(alias = "repaso1", skip_serializing_if = "Option::is_none")]
    pub pass1: Option<FieldValue>,
    /// Repaso 2
    #[serde(alias = "repaso2", skip_serializing_if = "Option::is_none")]
    pub pass2: Option<FieldValue>,

    #[serde(
        alias = "observaciones",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub observations: Option<String>,
}

impl PollinationObservation {
    /// Whether any count field or free-text field carries an entry
    pub fn has_entries(&self) -> bool {
        [
            &self.inflorescence,
            &self.antesis,
            &self.antesis_left,
            &self.post_antesis,
            &self.post_antesis_left,
            &self.emasculation,
            &self.application,
            &self.marking,
            &self.pass1,
            &self.pass2,
        ]
        .into_iter()
        .any(is_recorded)
            || self
                .observations
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
    }
}

/// One supervisory visit by one operator on one date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationVisit {
    #[serde(default, alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(
        default,
        alias = "fincaId",
        alias = "idFinca",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub farm_id: Option<String>,
    #[serde(default, alias = "fecha", deserialize_with = "deserialize_id")]
    pub date: String,
    #[serde(
        default,
        alias = "hora",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(
        default,
        alias = "evaluador",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub evaluator: Option<String>,
    /// Polinizador under evaluation
    #[serde(
        default,
        alias = "polinizador",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub operator: Option<String>,
    #[serde(
        default,
        alias = "fotoUrl",
        alias = "foto",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
    #[serde(
        default,
        alias = "firmaUrl",
        alias = "firma",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub signature_url: Option<String>,
    /// Sampled palms, in field-sheet order
    #[serde(
        default,
        alias = "detalles",
        alias = "registros",
        deserialize_with = "deserialize_observation_list"
    )]
    pub details: Vec<PollinationObservation>,
    /// Flat summary fields older records carry instead of `details`
    #[serde(flatten)]
    pub summary: PollinationObservation,
}

impl EvaluationVisit {
    /// Operator name, trimmed, if present
    pub fn operator_name(&self) -> Option<&str> {
        self.operator
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Evaluations of one farm as returned by the evaluations API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationsResponse {
    #[serde(default, alias = "evaluaciones", deserialize_with = "deserialize_visit_list")]
    pub evaluations: Vec<EvaluationVisit>,
    #[serde(
        default,
        alias = "evaluacionesPorFecha",
        deserialize_with = "deserialize_visit_groups"
    )]
    pub evaluations_by_date: IndexMap<String, Vec<EvaluationVisit>>,
    #[serde(
        default,
        alias = "evaluacionesPorPolinizador",
        deserialize_with = "deserialize_visit_groups"
    )]
    pub evaluations_by_operator: IndexMap<String, Vec<EvaluationVisit>>,
    #[serde(
        default,
        alias = "mensaje",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
}

/// Convert an untyped observation list; `null` or non-array yields an empty list
pub fn observations_from_value(value: &serde_json::Value) -> Vec<PollinationObservation> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                PollinationObservation::deserialize(item).unwrap_or_else(|e| {
                    tracing::debug!("Treating malformed observation as empty: {}", e);
                    PollinationObservation::default()
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn deserialize_observation_list<'de, D>(
    deserializer: D,
) -> Result<Vec<PollinationObservation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(observations_from_value(&value))
}

/// Parse a visit list one record at a time; malformed records are skipped
fn visits_from_value(value: serde_json::Value) -> Option<Vec<EvaluationVisit>> {
    match value {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<EvaluationVisit>(item) {
                    Ok(visit) => Some(visit),
                    Err(e) => {
                        tracing::warn!("Skipping malformed evaluation record: {}", e);
                        None
                    }
                })
                .collect(),
        ),
        _ => None,
    }
}

fn deserialize_visit_list<'de, D>(deserializer: D) -> Result<Vec<EvaluationVisit>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(visits_from_value(value).unwrap_or_default())
}

fn deserialize_visit_groups<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<EvaluationVisit>>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups = Option::<IndexMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(groups
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match visits_from_value(value) {
            Some(visits) => Some((key, visits)),
            None => {
                tracing::warn!("Skipping evaluation group {:?}: not a list", key);
                None
            }
        })
        .collect())
}
