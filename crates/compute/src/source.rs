//! JSON loaders for the patient roster and the reading stream.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;
use vitalroute_core::{
    DeviceId, InMemoryPatientRegistry, Patient, PatientRegistry, Result, SensorReading, VitalError,
};

/// One roster entry: the owning edge device plus the patient record.
#[derive(Debug, Deserialize)]
struct PatientRecord {
    device_id: DeviceId,
    #[serde(flatten)]
    patient: Patient,
}

/// Parse a JSON array of patient records into a registry.
pub fn parse_patients(json: &str) -> Result<InMemoryPatientRegistry> {
    let records: Vec<PatientRecord> = serde_json::from_str(json)?;
    let mut registry = InMemoryPatientRegistry::new();
    for record in records {
        registry.register(record.device_id, record.patient)?;
    }
    Ok(registry)
}

pub fn load_patients(path: impl AsRef<Path>) -> Result<InMemoryPatientRegistry> {
    let path = path.as_ref();
    let registry = parse_patients(&fs::read_to_string(path)?)
        .map_err(|e| with_path(e, path))?;
    info!(path = %path.display(), patients = registry.len(), "patient roster loaded");
    Ok(registry)
}

/// Parse a JSON array of readings. Values are range-checked later, per reading.
pub fn parse_readings(json: &str) -> Result<Vec<SensorReading>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_readings(path: impl AsRef<Path>) -> Result<Vec<SensorReading>> {
    let path = path.as_ref();
    let readings = parse_readings(&fs::read_to_string(path)?).map_err(|e| with_path(e, path))?;
    info!(path = %path.display(), readings = readings.len(), "readings loaded");
    Ok(readings)
}

fn with_path(err: VitalError, path: &Path) -> VitalError {
    match err {
        VitalError::Parse(msg) => VitalError::Parse(format!("{}: {}", path.display(), msg)),
        VitalError::InvalidRecord(msg) => {
            VitalError::InvalidRecord(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}
