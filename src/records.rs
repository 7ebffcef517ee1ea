//! Record operations callers run against a validated handle.
//!
//! Each operation locks the handle, runs one repository statement and logs
//! the outcome. Mutations run inside a transaction that commits on success and
//! rolls back on any failure, so a failed insert never leaves the shared
//! connection mid-transaction for the next caller.

use rusqlite::Connection;

use crate::db::{repository, DatabaseError, DbHandle};
use crate::models::{
    Medication, NewMedication, NewPatient, NewSymptom, NewVitals, Patient, Symptom,
    SymptomCorrelation, Vitals, WithPatient,
};

// ── Create ──────────────────────────────────────────────

/// Add a patient and return the id the store assigned.
pub fn add_patient(db: &DbHandle, patient: &NewPatient) -> Result<i64, DatabaseError> {
    let id = mutate(db, "add_patient", |conn| repository::insert_patient(conn, patient))?;
    tracing::info!(patient_id = id, name = %patient.name, "Patient added");
    Ok(id)
}

pub fn add_symptom(db: &DbHandle, symptom: &NewSymptom) -> Result<(), DatabaseError> {
    mutate(db, "add_symptom", |conn| repository::insert_symptom(conn, symptom))?;
    tracing::info!(patient_id = symptom.patient_id, description = %symptom.description, "Symptom added");
    Ok(())
}

pub fn add_medication(db: &DbHandle, med: &NewMedication) -> Result<(), DatabaseError> {
    mutate(db, "add_medication", |conn| repository::insert_medication(conn, med))?;
    tracing::info!(patient_id = med.patient_id, name = %med.name, "Medication added");
    Ok(())
}

pub fn add_vitals(db: &DbHandle, vitals: &NewVitals) -> Result<(), DatabaseError> {
    mutate(db, "add_vitals", |conn| repository::insert_vitals(conn, vitals))?;
    tracing::info!(patient_id = vitals.patient_id, "Vitals added");
    Ok(())
}

// ── Read ────────────────────────────────────────────────

pub fn get_all_patients(db: &DbHandle) -> Result<Vec<Patient>, DatabaseError> {
    read(db, "get_all_patients", repository::get_all_patients)
}

pub fn get_all_symptoms(db: &DbHandle) -> Result<Vec<WithPatient<Symptom>>, DatabaseError> {
    read(db, "get_all_symptoms", repository::get_all_symptoms)
}

pub fn get_all_medications(db: &DbHandle) -> Result<Vec<WithPatient<Medication>>, DatabaseError> {
    read(db, "get_all_medications", repository::get_all_medications)
}

pub fn get_all_vitals(db: &DbHandle) -> Result<Vec<WithPatient<Vitals>>, DatabaseError> {
    read(db, "get_all_vitals", repository::get_all_vitals)
}

pub fn get_patient(db: &DbHandle, patient_id: i64) -> Result<Option<Patient>, DatabaseError> {
    read(db, "get_patient", |conn| repository::get_patient(conn, patient_id))
}

pub fn get_patient_symptoms(db: &DbHandle, patient_id: i64) -> Result<Vec<Symptom>, DatabaseError> {
    let symptoms = read(db, "get_patient_symptoms", |conn| {
        repository::get_patient_symptoms(conn, patient_id)
    })?;
    tracing::debug!(patient_id, count = symptoms.len(), "Symptoms fetched");
    Ok(symptoms)
}

pub fn get_patient_medications(
    db: &DbHandle,
    patient_id: i64,
) -> Result<Vec<Medication>, DatabaseError> {
    read(db, "get_patient_medications", |conn| {
        repository::get_patient_medications(conn, patient_id)
    })
}

pub fn get_patient_vitals(db: &DbHandle, patient_id: i64) -> Result<Vec<Vitals>, DatabaseError> {
    read(db, "get_patient_vitals", |conn| {
        repository::get_patient_vitals(conn, patient_id)
    })
}

// ── Delete ──────────────────────────────────────────────

/// Delete one patient. Fails with `NotFound` if no row matched and with
/// `ConstraintViolation` if the patient still has dependent records.
pub fn delete_patient(db: &DbHandle, patient_id: i64) -> Result<(), DatabaseError> {
    mutate(db, "delete_patient", |conn| repository::delete_patient(conn, patient_id))?;
    tracing::info!(patient_id, "Patient deleted");
    Ok(())
}

// ── Search ──────────────────────────────────────────────

/// Distinct (patient, symptom) pairs whose description contains `fragment`.
///
/// The fragment is not validated here; callers reject empty input.
pub fn find_symptom_correlation(
    db: &DbHandle,
    fragment: &str,
) -> Result<Vec<SymptomCorrelation>, DatabaseError> {
    read(db, "find_symptom_correlation", |conn| {
        repository::find_symptom_correlation(conn, fragment)
    })
}

// ── Operation boundary ──────────────────────────────────

fn mutate<T, F>(db: &DbHandle, operation: &'static str, f: F) -> Result<T, DatabaseError>
where
    F: FnOnce(&Connection) -> Result<T, DatabaseError>,
{
    let result = db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        // Dropping `tx` without commit rolls back.
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    });
    if let Err(e) = &result {
        tracing::warn!(operation, generation = db.generation(), error = %e, "Record operation failed, rolled back");
    }
    result
}

fn read<T, F>(db: &DbHandle, operation: &'static str, f: F) -> Result<T, DatabaseError>
where
    F: FnOnce(&Connection) -> Result<T, DatabaseError>,
{
    let result = db.with_conn(f);
    if let Err(e) = &result {
        tracing::warn!(operation, generation = db.generation(), error = %e, "Record query failed");
    }
    result
}

/// Collapse results into "nothing happened" values for callers that only
/// render what they get (an empty list, no id, `false`).
pub mod sentinel {
    use crate::db::DatabaseError;

    pub fn ok_or_empty<T>(result: Result<Vec<T>, DatabaseError>) -> Vec<T> {
        result.unwrap_or_default()
    }

    pub fn ok_or_none<T>(result: Result<T, DatabaseError>) -> Option<T> {
        result.ok()
    }

    pub fn succeeded<T>(result: Result<T, DatabaseError>) -> bool {
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{ConnectionManager, SharedConnection};

    fn memory_handle() -> (ConnectionManager, SharedConnection) {
        let manager = ConnectionManager::new(DatabaseConfig::in_memory());
        let handle = manager.get_connection().unwrap();
        (manager, handle)
    }

    fn bob() -> NewPatient {
        NewPatient::new("Bob", 40, "Male", "555-0000")
    }

    fn in_transaction(db: &DbHandle) -> bool {
        db.with_conn(|conn| Ok(!conn.is_autocommit())).unwrap()
    }

    #[test]
    fn bob_and_aspirin_scenario() {
        let (_manager, db) = memory_handle();
        let id = add_patient(&db, &bob()).unwrap();
        assert_eq!(id, 1);

        let today = chrono::Local::now().date_naive();
        add_medication(
            &db,
            &NewMedication {
                patient_id: 1,
                name: "Aspirin".into(),
                dosage: "100mg".into(),
                frequency: "daily".into(),
                start_date: today,
                end_date: None,
            },
        )
        .unwrap();

        let meds = get_all_medications(&db).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].record.patient_id, 1);
        assert!(meds[0].record.end_date.is_none());
    }

    #[test]
    fn patient_ids_increase_within_session() {
        let (_manager, db) = memory_handle();
        let mut last = 0;
        for _ in 0..10 {
            let id = add_patient(&db, &bob()).unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn failed_insert_rolls_back_and_leaves_handle_clean() {
        let (_manager, db) = memory_handle();
        let result = add_symptom(&db, &NewSymptom::new(99, "Cough", 2, "1 day"));
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
        assert!(!in_transaction(&db));

        // The next caller on the same handle is unaffected
        let id = add_patient(&db, &bob()).unwrap();
        assert_eq!(get_patient(&db, id).unwrap().unwrap().name, "Bob");
    }

    #[test]
    fn every_creator_rolls_back_on_failure() {
        let (_manager, db) = memory_handle();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert!(add_symptom(&db, &NewSymptom::new(5, "x", 1, "")).is_err());
        assert!(!in_transaction(&db));
        assert!(add_medication(
            &db,
            &NewMedication {
                patient_id: 5,
                name: "x".into(),
                dosage: String::new(),
                frequency: String::new(),
                start_date: start,
                end_date: None,
            }
        )
        .is_err());
        assert!(!in_transaction(&db));
        assert!(add_vitals(&db, &NewVitals::for_patient(5)).is_err());
        assert!(!in_transaction(&db));
    }

    #[test]
    fn delete_outcomes() {
        let (_manager, db) = memory_handle();
        let lonely = add_patient(&db, &bob()).unwrap();
        let busy = add_patient(&db, &bob()).unwrap();
        add_vitals(&db, &NewVitals::for_patient(busy)).unwrap();

        delete_patient(&db, lonely).unwrap();
        assert!(matches!(
            delete_patient(&db, lonely),
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(delete_patient(&db, busy).unwrap_err().is_constraint_violation());
        assert!(!in_transaction(&db));

        let remaining: Vec<i64> = get_all_patients(&db)
            .unwrap()
            .into_iter()
            .map(|p| p.patient_id)
            .collect();
        assert_eq!(remaining, [busy]);
    }

    #[test]
    fn correlation_through_handle() {
        let (_manager, db) = memory_handle();
        let alice = add_patient(&db, &NewPatient::new("Alice", 28, "Female", "555-1122")).unwrap();
        add_symptom(&db, &NewSymptom::new(alice, "Sore Throat", 5, "2 days")).unwrap();

        let expected = SymptomCorrelation {
            patient_name: "Alice".into(),
            description: "Sore Throat".into(),
        };
        assert!(find_symptom_correlation(&db, "sore").unwrap().contains(&expected));
        assert!(find_symptom_correlation(&db, "SORE").unwrap().contains(&expected));
    }

    #[test]
    fn per_patient_reads() {
        let (_manager, db) = memory_handle();
        let id = add_patient(&db, &bob()).unwrap();
        add_symptom(&db, &NewSymptom::new(id, "Cough", 2, "3 days")).unwrap();
        add_vitals(&db, &NewVitals { heart_rate: Some(70), ..NewVitals::for_patient(id) }).unwrap();

        assert_eq!(get_patient_symptoms(&db, id).unwrap().len(), 1);
        assert!(get_patient_medications(&db, id).unwrap().is_empty());
        assert_eq!(get_patient_vitals(&db, id).unwrap()[0].heart_rate, Some(70));
        assert_eq!(get_all_symptoms(&db).unwrap()[0].patient_name, "Bob");
        assert_eq!(get_all_vitals(&db).unwrap().len(), 1);
    }

    #[test]
    fn closed_handle_reports_unavailable() {
        let (_manager, db) = memory_handle();
        db.close().unwrap();
        assert!(matches!(
            get_all_patients(&db),
            Err(DatabaseError::ConnectionUnavailable)
        ));
        assert!(matches!(
            add_patient(&db, &bob()),
            Err(DatabaseError::ConnectionUnavailable)
        ));
    }

    #[test]
    fn sentinels_collapse_failures() {
        let (_manager, db) = memory_handle();
        db.close().unwrap();

        assert!(sentinel::ok_or_empty(get_all_patients(&db)).is_empty());
        assert!(sentinel::ok_or_none(add_patient(&db, &bob())).is_none());
        assert!(!sentinel::succeeded(delete_patient(&db, 1)));
    }
}
