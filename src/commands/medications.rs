use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core_state::CoreState;
use crate::models::{Medication, NewMedication, WithPatient};
use crate::records;

/// Medication as entered on a form: dates are ISO strings, a blank end date
/// means the medication is ongoing and a blank start date means today.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub patient_id: i64,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn add_medication(state: &CoreState, entry: &MedicationEntry) -> Result<(), String> {
    let med = coerce_entry(entry, chrono::Local::now().date_naive())?;
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::add_medication(&conn, &med).map_err(|e| e.to_string())
}

pub fn list_medications(state: &CoreState) -> Result<Vec<WithPatient<Medication>>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_all_medications(&conn).map_err(|e| e.to_string())
}

pub fn patient_medications(state: &CoreState, patient_id: i64) -> Result<Vec<Medication>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_patient_medications(&conn, patient_id).map_err(|e| e.to_string())
}

fn coerce_entry(entry: &MedicationEntry, today: NaiveDate) -> Result<NewMedication, String> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err("Medication name is required".into());
    }

    let start_date = parse_date("start date", entry.start_date.as_deref())?.unwrap_or(today);
    let end_date = parse_date("end date", entry.end_date.as_deref())?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err("End date cannot be before start date".into());
        }
    }

    Ok(NewMedication {
        patient_id: entry.patient_id,
        name: name.to_string(),
        dosage: entry.dosage.trim().to_string(),
        frequency: entry.frequency.trim().to_string(),
        start_date,
        end_date,
    })
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid {field} format (expected YYYY-MM-DD): {value}")),
    }
}
