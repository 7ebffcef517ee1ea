pub mod correlation;
pub mod medication;
pub mod patient;
pub mod symptom;
pub mod vitals;

pub use correlation::*;
pub use medication::*;
pub use patient::*;
pub use symptom::*;
pub use vitals::*;

use serde::{Deserialize, Serialize};

/// A record joined with the name of the patient it belongs to.
///
/// Read-all listings return this shape; per-patient listings return the bare
/// record since the caller already knows the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithPatient<T> {
    pub patient_name: String,
    #[serde(flatten)]
    pub record: T,
}
