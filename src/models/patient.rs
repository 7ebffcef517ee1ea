use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub contact_info: String,
}

/// Patient fields supplied by the caller; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub contact_info: String,
}

impl NewPatient {
    pub fn new(
        name: impl Into<String>,
        age: i32,
        gender: impl Into<String>,
        contact_info: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
            contact_info: contact_info.into(),
        }
    }
}
