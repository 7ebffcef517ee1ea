use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{NewVitals, Vitals, WithPatient};

/// Insert a vitals entry. Absent measurements are stored as NULL and
/// `RecordedAt` is stamped by the store.
pub fn insert_vitals(conn: &Connection, vitals: &NewVitals) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO Vitals (PatientID, SystolicBP, DiastolicBP, HeartRate, Temperature,
         OxygenSaturation, RespiratoryRate, Weight, BloodGlucose, Notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            vitals.patient_id,
            vitals.systolic_bp,
            vitals.diastolic_bp,
            vitals.heart_rate,
            vitals.temperature,
            vitals.oxygen_saturation,
            vitals.respiratory_rate,
            vitals.weight,
            vitals.blood_glucose,
            vitals.notes,
        ],
    )?;
    Ok(())
}

/// Every vitals entry with its patient's name, most recent first.
pub fn get_all_vitals(conn: &Connection) -> Result<Vec<WithPatient<Vitals>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.Name AS PatientName, v.VitalID, v.PatientID, v.RecordedAt, v.SystolicBP,
         v.DiastolicBP, v.HeartRate, v.Temperature, v.OxygenSaturation, v.RespiratoryRate,
         v.Weight, v.BloodGlucose, v.Notes
         FROM Vitals v
         JOIN Patient p ON p.PatientID = v.PatientID
         ORDER BY v.RecordedAt DESC, v.VitalID DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(WithPatient {
            patient_name: row.get("PatientName")?,
            record: row_to_vitals(row)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Vitals recorded for one patient, most recent first.
pub fn get_patient_vitals(conn: &Connection, patient_id: i64) -> Result<Vec<Vitals>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT VitalID, PatientID, RecordedAt, SystolicBP, DiastolicBP, HeartRate,
         Temperature, OxygenSaturation, RespiratoryRate, Weight, BloodGlucose, Notes
         FROM Vitals
         WHERE PatientID = ?1
         ORDER BY RecordedAt DESC, VitalID DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_vitals)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_vitals(row: &rusqlite::Row) -> Result<Vitals, rusqlite::Error> {
    Ok(Vitals {
        vital_id: row.get("VitalID")?,
        patient_id: row.get("PatientID")?,
        recorded_at: row.get("RecordedAt")?,
        systolic_bp: row.get("SystolicBP")?,
        diastolic_bp: row.get("DiastolicBP")?,
        heart_rate: row.get("HeartRate")?,
        temperature: row.get("Temperature")?,
        oxygen_saturation: row.get("OxygenSaturation")?,
        respiratory_rate: row.get("RespiratoryRate")?,
        weight: row.get("Weight")?,
        blood_glucose: row.get("BloodGlucose")?,
        notes: row.get("Notes")?,
    })
}
