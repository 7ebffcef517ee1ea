use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::SymptomCorrelation;

/// Patients whose recorded symptoms contain `fragment`, case-insensitively.
///
/// Both sides go through the connection's Unicode `fold` function. The
/// fragment is wrapped in `%` as-is, so `%` and `_` inside it keep their LIKE
/// meaning. Distinct (patient, description) pairs, ordered by patient name.
pub fn find_symptom_correlation(
    conn: &Connection,
    fragment: &str,
) -> Result<Vec<SymptomCorrelation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.Name, s.Description
         FROM Symptom s
         INNER JOIN Patient p ON p.PatientID = s.PatientID
         WHERE fold(s.Description) LIKE '%' || fold(?1) || '%'
         ORDER BY p.Name ASC, s.Description ASC",
    )?;
    let rows = stmt.query_map(params![fragment], |row| {
        Ok(SymptomCorrelation {
            patient_name: row.get(0)?,
            description: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
