use serde::{Deserialize, Serialize};

/// One prescribed medicine. All three fields are non-empty once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub duration: String,
}

impl Medicine {
    pub fn new(name: &str, dosage: &str, duration: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: dosage.to_string(),
            duration: duration.to_string(),
        }
    }

    /// Every field carries visible text.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.dosage.trim().is_empty()
            && !self.duration.trim().is_empty()
    }
}

/// Prescription attached to a patient. Also the body of `PUT /prescription/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub diagnosis: String,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Prescription {
    /// Notes worth printing: present and not blank.
    pub fn printable_notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
