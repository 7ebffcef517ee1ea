use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{NewSymptom, Symptom, WithPatient};

/// Insert a symptom. `ReportDate` is stamped by the store.
pub fn insert_symptom(conn: &Connection, symptom: &NewSymptom) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO Symptom (PatientID, Description, Severity, Duration)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            symptom.patient_id,
            symptom.description,
            symptom.severity,
            symptom.duration,
        ],
    )?;
    Ok(())
}

/// Every symptom with its patient's name, most recent report first.
pub fn get_all_symptoms(conn: &Connection) -> Result<Vec<WithPatient<Symptom>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.Name AS PatientName, s.SymptomID, s.PatientID, s.Description,
         s.Severity, s.Duration, s.ReportDate
         FROM Symptom s
         JOIN Patient p ON p.PatientID = s.PatientID
         ORDER BY s.ReportDate DESC, s.SymptomID DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(WithPatient {
            patient_name: row.get("PatientName")?,
            record: row_to_symptom(row)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Symptoms reported for one patient, most recent first.
pub fn get_patient_symptoms(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Symptom>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT SymptomID, PatientID, Description, Severity, Duration, ReportDate
         FROM Symptom
         WHERE PatientID = ?1
         ORDER BY ReportDate DESC, SymptomID DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_symptom)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_symptom(row: &rusqlite::Row) -> Result<Symptom, rusqlite::Error> {
    Ok(Symptom {
        symptom_id: row.get("SymptomID")?,
        patient_id: row.get("PatientID")?,
        description: row.get("Description")?,
        severity: row.get::<_, Option<i32>>("Severity")?.unwrap_or_default(),
        duration: row.get::<_, Option<String>>("Duration")?.unwrap_or_default(),
        report_date: row.get("ReportDate")?,
    })
}
