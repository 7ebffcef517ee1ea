use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One set of vital-sign measurements taken at the same time.
///
/// Every measurement is optional: a nurse may record only a temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub vital_id: i64,
    pub patient_id: i64,
    /// Set by the store when the row is inserted.
    pub recorded_at: NaiveDateTime,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub heart_rate: Option<i32>,
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Percent SpO2.
    pub oxygen_saturation: Option<f64>,
    pub respiratory_rate: Option<i32>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// mg/dL.
    pub blood_glucose: Option<f64>,
    pub notes: Option<String>,
}

impl Vitals {
    /// Number of measurements present (notes excluded).
    pub fn measurement_count(&self) -> usize {
        [
            self.systolic_bp.is_some(),
            self.diastolic_bp.is_some(),
            self.heart_rate.is_some(),
            self.temperature.is_some(),
            self.oxygen_saturation.is_some(),
            self.respiratory_rate.is_some(),
            self.weight.is_some(),
            self.blood_glucose.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVitals {
    pub patient_id: i64,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub respiratory_rate: Option<i32>,
    pub weight: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub notes: Option<String>,
}

impl NewVitals {
    /// A vitals entry with every measurement absent.
    pub fn for_patient(patient_id: i64) -> Self {
        Self {
            patient_id,
            ..Self::default()
        }
    }
}
