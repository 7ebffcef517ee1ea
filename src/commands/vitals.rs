use serde::{Deserialize, Serialize};

use super::parse_optional;
use crate::core_state::CoreState;
use crate::models::{NewVitals, Vitals, WithPatient};
use crate::records;

/// Vital signs as entered on a form. Every measurement is free text; blank
/// fields are stored as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalsEntry {
    pub patient_id: i64,
    pub systolic_bp: Option<String>,
    pub diastolic_bp: Option<String>,
    pub heart_rate: Option<String>,
    pub temperature: Option<String>,
    pub oxygen_saturation: Option<String>,
    pub respiratory_rate: Option<String>,
    pub weight: Option<String>,
    pub blood_glucose: Option<String>,
    pub notes: Option<String>,
}

impl VitalsEntry {
    fn coerce(&self) -> Result<NewVitals, String> {
        Ok(NewVitals {
            patient_id: self.patient_id,
            systolic_bp: parse_optional("systolic blood pressure", self.systolic_bp.as_deref())?,
            diastolic_bp: parse_optional("diastolic blood pressure", self.diastolic_bp.as_deref())?,
            heart_rate: parse_optional("heart rate", self.heart_rate.as_deref())?,
            temperature: parse_measurement("temperature", self.temperature.as_deref())?,
            oxygen_saturation: parse_measurement("oxygen saturation", self.oxygen_saturation.as_deref())?,
            respiratory_rate: parse_optional("respiratory rate", self.respiratory_rate.as_deref())?,
            weight: parse_measurement("weight", self.weight.as_deref())?,
            blood_glucose: parse_measurement("blood glucose", self.blood_glucose.as_deref())?,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }
}

// `f64::from_str` accepts "NaN" and "inf", which the store would keep as NULL.
fn parse_measurement(field: &str, raw: Option<&str>) -> Result<Option<f64>, String> {
    match parse_optional::<f64>(field, raw)? {
        Some(value) if !value.is_finite() => Err(format!("Invalid {field}: {value}")),
        parsed => Ok(parsed),
    }
}

pub fn record_vitals(state: &CoreState, entry: &VitalsEntry) -> Result<(), String> {
    let vitals = entry.coerce()?;
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::add_vitals(&conn, &vitals).map_err(|e| e.to_string())
}

pub fn list_vitals(state: &CoreState) -> Result<Vec<WithPatient<Vitals>>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_all_vitals(&conn).map_err(|e| e.to_string())
}

pub fn patient_vitals(state: &CoreState, patient_id: i64) -> Result<Vec<Vitals>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_patient_vitals(&conn, patient_id).map_err(|e| e.to_string())
}
