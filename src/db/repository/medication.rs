use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Medication, NewMedication, WithPatient};

pub fn insert_medication(conn: &Connection, med: &NewMedication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO Medication (PatientID, Name, Dosage, Frequency, StartDate, EndDate)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            med.patient_id,
            med.name,
            med.dosage,
            med.frequency,
            med.start_date,
            med.end_date,
        ],
    )?;
    Ok(())
}

/// Every medication with its patient's name, latest start date first.
pub fn get_all_medications(
    conn: &Connection,
) -> Result<Vec<WithPatient<Medication>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.Name AS PatientName, m.MedicationID, m.PatientID, m.Name, m.Dosage,
         m.Frequency, m.StartDate, m.EndDate
         FROM Medication m
         JOIN Patient p ON p.PatientID = m.PatientID
         ORDER BY m.StartDate DESC, m.MedicationID DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(WithPatient {
            patient_name: row.get("PatientName")?,
            record: row_to_medication(row)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_patient_medications(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT MedicationID, PatientID, Name, Dosage, Frequency, StartDate, EndDate
         FROM Medication
         WHERE PatientID = ?1
         ORDER BY StartDate DESC, MedicationID DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_medication)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

// The joined query aliases the patient's name, so `Name` is the medication's.
fn row_to_medication(row: &rusqlite::Row) -> Result<Medication, rusqlite::Error> {
    Ok(Medication {
        medication_id: row.get("MedicationID")?,
        patient_id: row.get("PatientID")?,
        name: row.get("Name")?,
        dosage: row.get::<_, Option<String>>("Dosage")?.unwrap_or_default(),
        frequency: row.get::<_, Option<String>>("Frequency")?.unwrap_or_default(),
        start_date: row.get("StartDate")?,
        end_date: row.get("EndDate")?,
    })
}
