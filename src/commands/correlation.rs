use crate::core_state::CoreState;
use crate::models::SymptomCorrelation;
use crate::records;

/// Finds every patient who reported a symptom containing `text`.
pub fn search_symptom(state: &CoreState, text: &str) -> Result<Vec<SymptomCorrelation>, String> {
    let fragment = text.trim();
    if fragment.is_empty() {
        return Err("Symptom text is required".into());
    }

    let conn = state.open_db().map_err(|e| e.to_string())?;
    records::find_symptom_correlation(&conn, fragment).map_err(|e| e.to_string())
}
