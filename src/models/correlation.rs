use serde::{Deserialize, Serialize};

/// One patient sharing a symptom matched by a correlation search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymptomCorrelation {
    pub patient_name: String,
    pub description: String,
}
