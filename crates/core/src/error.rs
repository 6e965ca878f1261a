use thiserror::Error;

use crate::patient::DeviceId;

#[derive(Error, Debug)]
pub enum VitalError {
    /// Static configuration is unusable. Always fatal, raised before scoring starts.
    #[error("Config invariant violated: {0}")]
    ConfigInvariantViolation(String),

    #[error("Patient {patient_id} not found on device {device_id}")]
    PatientNotFound {
        patient_id: String,
        device_id: DeviceId,
    },

    /// The learned-model path could not produce a prediction.
    #[error("Scorer unavailable: {0}")]
    ScorerUnavailable(String),

    #[error("Malformed reading: {0}")]
    MalformedReading(String),

    #[error("No edge device configured with id {0}")]
    UnknownDevice(DeviceId),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl VitalError {
    /// Per-task conditions skip one reading; everything else stops the run.
    pub fn is_per_task(&self) -> bool {
        matches!(
            self,
            VitalError::PatientNotFound { .. }
                | VitalError::ScorerUnavailable(_)
                | VitalError::MalformedReading(_)
                | VitalError::UnknownDevice(_)
        )
    }
}

impl From<serde_json::Error> for VitalError {
    fn from(e: serde_json::Error) -> Self {
        VitalError::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for VitalError {
    fn from(e: toml::de::Error) -> Self {
        VitalError::Parse(e.to_string())
    }
}

/// Result alias for vitalroute operations.
pub type Result<T> = std::result::Result<T, VitalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_task_classification() {
        assert!(VitalError::MalformedReading("hr".into()).is_per_task());
        assert!(VitalError::ScorerUnavailable("untrained".into()).is_per_task());
        assert!(VitalError::UnknownDevice(9).is_per_task());
        assert!(VitalError::PatientNotFound {
            patient_id: "P1".into(),
            device_id: 1
        }
        .is_per_task());
        assert!(!VitalError::ConfigInvariantViolation("tie".into()).is_per_task());
        assert!(!VitalError::InvalidRecord("dup".into()).is_per_task());
    }

    #[test]
    fn not_found_message_names_both_keys() {
        let err = VitalError::PatientNotFound {
            patient_id: "P042".into(),
            device_id: 2,
        };
        assert_eq!(err.to_string(), "Patient P042 not found on device 2");
    }
}
