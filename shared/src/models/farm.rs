//! Farm (finca) models

use serde::{Deserialize, Serialize};

use crate::types::{deserialize_id, deserialize_opt_text};

/// A farm site, the top-level unit evaluations are grouped under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(
        default,
        alias = "ubicacion",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        alias = "totalEvaluaciones",
        skip_serializing_if = "Option::is_none"
    )]
    pub evaluation_count: Option<u32>,
}

/// Farm listing as returned upstream: either a bare array or a wrapped one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FarmList {
    Bare(Vec<Farm>),
    Wrapped {
        #[serde(alias = "fincas")]
        farms: Vec<Farm>,
    },
}

impl FarmList {
    pub fn into_farms(self) -> Vec<Farm> {
        match self {
            FarmList::Bare(farms) | FarmList::Wrapped { farms } => farms,
        }
    }
}
