pub mod csv;
pub mod json;

use serde::Serialize;

use crate::index::{LineIndex, TypeCount};

pub use crate::error::ExportError;
pub use csv::{export_types_csv, write_types_csv};
pub use json::{export_types_json, properties_json};

/// Type counts of one loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub total: usize,
    pub types: Vec<TypeCount>,
}

impl ModelSummary {
    #[must_use]
    pub fn new(model: impl Into<String>, index: &LineIndex) -> Self {
        Self {
            model: model.into(),
            total: index.len(),
            types: index.type_summary(),
        }
    }
}
