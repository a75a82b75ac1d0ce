// src/export/mod.rs

pub mod aggregate;
pub mod table;

use serde::{Deserialize, Serialize};

/// Output shape selector for results aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportShape {
    Flat,
    Nested,
}

/// Either export shape, produced from the same read by two independent pure
/// projections (one join-free, one join-based).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SurveyExport {
    Flat(aggregate::FlatExport),
    Nested(aggregate::NestedExport),
}
