use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    pub symptom_id: i64,
    pub patient_id: i64,
    pub description: String,
    pub severity: i32,
    pub duration: String,
    /// Set by the store when the row is inserted.
    pub report_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSymptom {
    pub patient_id: i64,
    pub description: String,
    pub severity: i32,
    pub duration: String,
}

impl NewSymptom {
    pub fn new(
        patient_id: i64,
        description: impl Into<String>,
        severity: i32,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            description: description.into(),
            severity,
            duration: duration.into(),
        }
    }
}
