use crate::core_state::CoreState;
use crate::models::{NewSymptom, Symptom, WithPatient};
use crate::records;

const MAX_DESCRIPTION_LEN: usize = 500;

/// Records a symptom reported by a patient.
pub fn record_symptom(state: &CoreState, entry: &NewSymptom) -> Result<(), String> {
    let description = entry.description.trim();
    if description.is_empty() {
        return Err("Symptom description is required".into());
    }
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err("Symptom description too long".into());
    }
    if entry.severity < 0 {
        return Err("Severity cannot be negative".into());
    }

    let conn = state.open_db().map_err(|e| e.to_string())?;
    let symptom = NewSymptom {
        description: description.to_string(),
        duration: entry.duration.trim().to_string(),
        ..entry.clone()
    };
    records::add_symptom(&conn, &symptom).map_err(|e| e.to_string())
}

/// All symptoms with patient names, most recent first.
pub fn list_symptoms(state: &CoreState) -> Result<Vec<WithPatient<Symptom>>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_all_symptoms(&conn).map_err(|e| e.to_string())
}

pub fn patient_symptoms(state: &CoreState, patient_id: i64) -> Result<Vec<Symptom>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_patient_symptoms(&conn, patient_id).map_err(|e| e.to_string())
}
