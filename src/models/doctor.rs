use serde::{Deserialize, Serialize};

/// Directory entry for a dermatologist patients can be referred to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorsBySpecialty {
    pub specialty: String,
    pub doctors: Vec<Doctor>,
}
