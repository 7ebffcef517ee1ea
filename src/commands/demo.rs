//! Scripted walkthrough: one patient, one symptom, one medication, read back.

use serde::Serialize;

use crate::core_state::CoreState;
use crate::models::{NewMedication, NewPatient, NewSymptom, Symptom};
use crate::records;

#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub patient_id: i64,
    pub symptoms: Vec<Symptom>,
}

pub fn run_demo(state: &CoreState) -> Result<DemoReport, String> {
    let conn = state.open_db().map_err(|e| e.to_string())?;

    let patient_id = records::add_patient(
        &conn,
        &NewPatient::new("Alice Johnson", 28, "Female", "555-1122"),
    )
    .map_err(|e| e.to_string())?;

    records::add_symptom(&conn, &NewSymptom::new(patient_id, "Sore Throat", 5, "2 days"))
        .map_err(|e| e.to_string())?;

    records::add_medication(
        &conn,
        &NewMedication {
            patient_id,
            name: "Lozenges".into(),
            dosage: "1 every 4 hours".into(),
            frequency: "As needed".into(),
            start_date: chrono::Local::now().date_naive(),
            end_date: None,
        },
    )
    .map_err(|e| e.to_string())?;

    let symptoms = records::get_patient_symptoms(&conn, patient_id).map_err(|e| e.to_string())?;
    Ok(DemoReport {
        patient_id,
        symptoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[test]
    fn demo_workflow_reads_back_symptom() {
        let state = CoreState::new(DatabaseConfig::in_memory());
        let report = run_demo(&state).unwrap();
        assert_eq!(report.patient_id, 1);
        assert_eq!(report.symptoms.len(), 1);
        assert_eq!(report.symptoms[0].description, "Sore Throat");
        assert_eq!(report.symptoms[0].severity, 5);

        let conn = state.open_db().unwrap();
        let meds = records::get_patient_medications(&conn, 1).unwrap();
        assert_eq!(meds[0].name, "Lozenges");
    }

    #[test]
    fn demo_twice_creates_second_patient() {
        let state = CoreState::new(DatabaseConfig::in_memory());
        run_demo(&state).unwrap();
        let second = run_demo(&state).unwrap();
        assert_eq!(second.patient_id, 2);
        assert_eq!(second.symptoms.len(), 1);
    }
}
