use crate::core_state::CoreState;
use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient};
use crate::records;

const MAX_NAME_LEN: usize = 200;
const MAX_AGE: i32 = 150;

/// Registers a patient and returns the assigned id.
pub fn add_patient(state: &CoreState, entry: &NewPatient) -> Result<i64, String> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err("Patient name is required".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err("Patient name too long".into());
    }
    if !(0..=MAX_AGE).contains(&entry.age) {
        return Err(format!("Age must be between 0 and {MAX_AGE}"));
    }

    let conn = state.open_db().map_err(|e| e.to_string())?;
    let patient = NewPatient {
        name: name.to_string(),
        gender: entry.gender.trim().to_string(),
        contact_info: entry.contact_info.trim().to_string(),
        age: entry.age,
    };
    records::add_patient(&conn, &patient).map_err(|e| e.to_string())
}

pub fn list_patients(state: &CoreState) -> Result<Vec<Patient>, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::get_all_patients(&conn).map_err(|e| e.to_string())
}

/// Deletes a patient that has no symptoms, medications or vitals on file.
pub fn delete_patient(state: &CoreState, patient_id: i64) -> Result<(), String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::delete_patient(&conn, patient_id).map_err(|e| match e {
        DatabaseError::ConstraintViolation(_) => format!(
            "Patient {patient_id} still has symptoms, medications or vitals on file"
        ),
        DatabaseError::NotFound { .. } => format!("Patient {patient_id} not found"),
        other => other.to_string(),
    })
}
