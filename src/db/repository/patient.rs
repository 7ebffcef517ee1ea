use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient};

/// Insert a patient and return the id the store assigned to it.
pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    let id = conn.query_row(
        "INSERT INTO Patient (Name, Age, Gender, ContactInfo)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING PatientID",
        params![
            patient.name,
            patient.age,
            patient.gender,
            patient.contact_info,
        ],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(id)
}

/// All patients, oldest id first.
pub fn get_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT PatientID, Name, Age, Gender, ContactInfo
         FROM Patient
         ORDER BY PatientID ASC",
    )?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_patient(conn: &Connection, patient_id: i64) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            "SELECT PatientID, Name, Age, Gender, ContactInfo
             FROM Patient
             WHERE PatientID = ?1",
            params![patient_id],
            row_to_patient,
        )
        .optional()?;
    Ok(patient)
}

/// Delete exactly one patient.
///
/// Patients with symptoms, medications or vitals are refused by the foreign
/// keys and surface as [`DatabaseError::ConstraintViolation`]; nothing cascades.
pub fn delete_patient(conn: &Connection, patient_id: i64) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM Patient WHERE PatientID = ?1",
        params![patient_id],
    )?;
    if affected != 1 {
        return Err(DatabaseError::not_found("patient", patient_id));
    }
    Ok(())
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        patient_id: row.get("PatientID")?,
        name: row.get("Name")?,
        age: row.get::<_, Option<i32>>("Age")?.unwrap_or_default(),
        gender: row.get::<_, Option<String>>("Gender")?.unwrap_or_default(),
        contact_info: row
            .get::<_, Option<String>>("ContactInfo")?
            .unwrap_or_default(),
    })
}
