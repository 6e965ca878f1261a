use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VitalError};
use crate::patient::{DeviceId, Patient, PatientCategory};

/// Unique identifier assigned to each task at creation.
pub type TaskId = Uuid;

/// Physically plausible heart rate in bpm.
pub const PLAUSIBLE_HEART_RATE: RangeInclusive<i32> = 0..=350;
/// Physically plausible blood pressure in mmHg.
pub const PLAUSIBLE_BLOOD_PRESSURE: RangeInclusive<i32> = 0..=400;
/// Physically plausible glucose level in mg/dL.
pub const PLAUSIBLE_GLUCOSE: RangeInclusive<f64> = 1.0..=2000.0;

/// One raw reading from a sensor stream, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub patient_id: String,
    pub heart_rate: i32,
    pub blood_pressure: i32,
    pub glucose_level: f64,
    /// Simulation-relative time.
    pub timestamp: f64,
    pub device_id: DeviceId,
}

impl SensorReading {
    /// Reject values outside the plausible domain before they reach scoring.
    pub fn validate(&self) -> Result<()> {
        if !PLAUSIBLE_HEART_RATE.contains(&self.heart_rate) {
            return Err(self.malformed(format!("heart rate {} bpm", self.heart_rate)));
        }
        if !PLAUSIBLE_BLOOD_PRESSURE.contains(&self.blood_pressure) {
            return Err(self.malformed(format!("blood pressure {} mmHg", self.blood_pressure)));
        }
        if !self.glucose_level.is_finite() || !PLAUSIBLE_GLUCOSE.contains(&self.glucose_level) {
            return Err(self.malformed(format!("glucose level {} mg/dL", self.glucose_level)));
        }
        if !self.timestamp.is_finite() {
            return Err(self.malformed(format!("timestamp {}", self.timestamp)));
        }
        Ok(())
    }

    fn malformed(&self, what: String) -> VitalError {
        VitalError::MalformedReading(format!(
            "{} for patient {} on device {} at t={}",
            what, self.patient_id, self.device_id, self.timestamp
        ))
    }
}

/// Urgency (k-value) and tie-break weight (m-value) produced by scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Always within `[0.0, 2.0]`.
    pub urgency: f64,
    /// Rule-based weights come from the parameter table; learned weights are unbounded.
    pub weight: f64,
}

/// One scored unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthTask {
    pub id: TaskId,
    pub patient_id: String,
    pub heart_rate: u32,
    pub blood_pressure: u32,
    pub glucose_level: f64,
    pub category: PatientCategory,
    pub timestamp: f64,
    pub device_id: DeviceId,
    score: PriorityScore,
    scored: bool,
}

impl HealthTask {
    /// Build a task from a validated reading, copying the patient's category.
    pub fn from_reading(reading: &SensorReading, patient: &Patient) -> Result<Self> {
        reading.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            patient_id: reading.patient_id.clone(),
            heart_rate: reading.heart_rate.unsigned_abs(),
            blood_pressure: reading.blood_pressure.unsigned_abs(),
            glucose_level: reading.glucose_level,
            category: patient.category,
            timestamp: reading.timestamp,
            device_id: reading.device_id,
            score: PriorityScore::default(),
            scored: false,
        })
    }

    /// Construct an unscored task directly from vitals.
    pub fn new(
        patient_id: impl Into<String>,
        heart_rate: u32,
        blood_pressure: u32,
        glucose_level: f64,
        category: PatientCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: patient_id.into(),
            heart_rate,
            blood_pressure,
            glucose_level,
            category,
            timestamp: 0.0,
            device_id: 1,
            score: PriorityScore::default(),
            scored: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }

    /// Current score; zero until scored.
    pub fn score(&self) -> PriorityScore {
        self.score
    }

    pub fn urgency(&self) -> f64 {
        self.score.urgency
    }

    pub fn weight(&self) -> f64 {
        self.score.weight
    }

    pub fn is_scored(&self) -> bool {
        self.scored
    }

    /// Overwrite both derived fields at once.
    pub fn apply_score(&mut self, score: PriorityScore) {
        self.score = score;
        self.scored = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Sex;

    fn reading(hr: i32, bp: i32, glucose: f64) -> SensorReading {
        SensorReading {
            patient_id: "P1".into(),
            heart_rate: hr,
            blood_pressure: bp,
            glucose_level: glucose,
            timestamp: 3.0,
            device_id: 2,
        }
    }

    fn patient(category: PatientCategory) -> Patient {
        Patient {
            patient_id: "P1".into(),
            category,
            age: 60,
            height: 162.0,
            weight: 65.0,
            sex: Sex::Female,
        }
    }

    #[test]
    fn task_copies_category_and_starts_unscored() {
        let task =
            HealthTask::from_reading(&reading(72, 110, 95.0), &patient(PatientCategory::Specific))
                .unwrap();
        assert_eq!(task.category, PatientCategory::Specific);
        assert_eq!(task.device_id, 2);
        assert_eq!(task.timestamp, 3.0);
        assert_eq!(task.heart_rate, 72);
        assert!(!task.is_scored());
        assert_eq!(task.urgency(), 0.0);
        assert_eq!(task.weight(), 0.0);
    }

    #[test]
    fn negative_heart_rate_is_malformed() {
        let err = HealthTask::from_reading(&reading(-5, 110, 95.0), &patient(PatientCategory::General))
            .unwrap_err();
        assert!(matches!(err, VitalError::MalformedReading(_)));
    }

    #[test]
    fn implausible_values_are_malformed() {
        assert!(reading(72, 900, 95.0).validate().is_err());
        assert!(reading(72, 110, -1.0).validate().is_err());
        assert!(reading(72, 110, f64::NAN).validate().is_err());
        assert!(reading(400, 110, 95.0).validate().is_err());
        assert!(reading(180, 200, 300.0).validate().is_ok());
    }

    #[test]
    fn apply_score_overwrites_both_fields() {
        let mut task = HealthTask::new("P1", 72, 120, 95.0, PatientCategory::General);
        task.apply_score(PriorityScore { urgency: 1.2, weight: 3.0 });
        task.apply_score(PriorityScore { urgency: 0.4, weight: 1.0 });
        assert!(task.is_scored());
        assert_eq!(task.score(), PriorityScore { urgency: 0.4, weight: 1.0 });
    }

    #[test]
    fn new_tasks_get_distinct_ids() {
        let a = HealthTask::new("P1", 72, 120, 95.0, PatientCategory::General);
        let b = HealthTask::new("P1", 72, 120, 95.0, PatientCategory::General);
        assert_ne!(a.id, b.id);
    }
}
