use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalError};

/// Identifier of the edge device a sensor stream (and its patients) belongs to.
pub type DeviceId = u32;

/// Selects the scoring path for a patient's readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientCategory {
    /// Scored by the fixed normal-range rules.
    General,
    /// Scored by the individualized learned models.
    Specific,
}

impl std::fmt::Display for PatientCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatientCategory::General => write!(f, "general"),
            PatientCategory::Specific => write!(f, "specific"),
        }
    }
}

impl std::str::FromStr for PatientCategory {
    type Err = VitalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(PatientCategory::General),
            "specific" => Ok(PatientCategory::Specific),
            other => Err(VitalError::InvalidRecord(format!(
                "unknown patient category '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M", alias = "male")]
    Male,
    #[serde(rename = "F", alias = "female")]
    Female,
}

impl Sex {
    /// Encoding used in the learned-model feature vector.
    pub fn indicator(&self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub category: PatientCategory,
    pub age: u32,
    /// Height in cm.
    pub height: f64,
    /// Weight in kg.
    pub weight: f64,
    pub sex: Sex,
}

impl Patient {
    /// Reject records with empty identifiers or non-positive body measurements.
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.trim().is_empty() {
            return Err(VitalError::InvalidRecord("empty patient_id".into()));
        }
        if self.age == 0 {
            return Err(VitalError::InvalidRecord(format!(
                "patient {}: age must be positive",
                self.patient_id
            )));
        }
        for (name, value) in [("height", self.height), ("weight", self.weight)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(VitalError::InvalidRecord(format!(
                    "patient {}: {} must be a positive number, got {}",
                    self.patient_id, name, value
                )));
            }
        }
        Ok(())
    }
}

/// Read-only lookup of patients by `(device, patient)`.
///
/// The same patient id may exist independently on several devices.
pub trait PatientRegistry: Send + Sync {
    fn get(&self, patient_id: &str, device_id: DeviceId) -> Option<&Patient>;

    fn lookup(&self, patient_id: &str, device_id: DeviceId) -> Result<&Patient> {
        self.get(patient_id, device_id)
            .ok_or_else(|| VitalError::PatientNotFound {
                patient_id: patient_id.to_string(),
                device_id,
            })
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Patient registry populated once at startup.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPatientRegistry {
    patients: HashMap<(DeviceId, String), Patient>,
}

impl InMemoryPatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated patient. Duplicate ids on the same device are rejected.
    pub fn register(&mut self, device_id: DeviceId, patient: Patient) -> Result<()> {
        patient.validate()?;
        let key = (device_id, patient.patient_id.clone());
        if self.patients.contains_key(&key) {
            return Err(VitalError::InvalidRecord(format!(
                "duplicate patient {} on device {}",
                patient.patient_id, device_id
            )));
        }
        self.patients.insert(key, patient);
        Ok(())
    }

    /// Number of patients registered on one device.
    pub fn count_for_device(&self, device_id: DeviceId) -> usize {
        self.patients.keys().filter(|(d, _)| *d == device_id).count()
    }
}

impl PatientRegistry for InMemoryPatientRegistry {
    fn get(&self, patient_id: &str, device_id: DeviceId) -> Option<&Patient> {
        self.patients.get(&(device_id, patient_id.to_string()))
    }

    fn len(&self) -> usize {
        self.patients.len()
    }
}
