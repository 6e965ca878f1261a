//! Per-reading pipeline: registry lookup, validation, scoring, dispatch and
//! reporting, in input order.
//!
//! Per-task failures (unknown patient, malformed reading, unavailable
//! scorer, unknown device) are logged, counted in [`IntakeSummary`] and
//! skipped. Any other error (an unreadable registry, for one) stops the run.


use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use vitalroute_core::{HealthTask, PatientRegistry, Result, SensorReading, VitalError};

use crate::dispatch::{DispatchPolicy, Infrastructure, JitterSource, PlacementDecision};
use crate::report::ReportingSink;
use crate::scoring::PriorityEngine;

/// What to do with a `specific` task whose learned scorer cannot answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailablePolicy {
    /// Skip the task and count it.
    #[default]
    Reject,
    /// Score it with the rule-based path instead and count the substitution.
    FallbackToRules,
}

/// Outcome counters for one intake run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntakeSummary {
    pub readings_seen: u64,
    pub dispatched: u64,
    pub patient_not_found: u64,
    pub malformed: u64,
    pub scorer_unavailable: u64,
    pub fallback_scored: u64,
    pub unknown_device: u64,
    pub critical_alerts: u64,
}

impl IntakeSummary {
    /// Readings that produced no placement.
    pub fn skipped(&self) -> u64 {
        self.readings_seen - self.dispatched
    }

    fn count_skip(&mut self, err: &VitalError) {
        match err {
            VitalError::PatientNotFound { .. } => self.patient_not_found += 1,
            VitalError::MalformedReading(_) => self.malformed += 1,
            VitalError::ScorerUnavailable(_) => self.scorer_unavailable += 1,
            VitalError::UnknownDevice(_) => self.unknown_device += 1,
            VitalError::ConfigInvariantViolation(_)
            | VitalError::InvalidRecord(_)
            | VitalError::Io(_)
            | VitalError::Parse(_) => {}
        }
    }
}

pub struct TaskIntakeLoop<R, J, S>
where
    R: PatientRegistry,
    J: JitterSource,
    S: ReportingSink,
{
    registry: R,
    engine: PriorityEngine,
    policy: DispatchPolicy<J>,
    infrastructure: Infrastructure,
    sink: S,
    unavailable: UnavailablePolicy,
    summary: IntakeSummary,
}

impl<R, J, S> TaskIntakeLoop<R, J, S>
where
    R: PatientRegistry,
    J: JitterSource,
    S: ReportingSink,
{
    pub fn new(
        registry: R,
        engine: PriorityEngine,
        policy: DispatchPolicy<J>,
        infrastructure: Infrastructure,
        sink: S,
    ) -> Self {
        Self {
            registry,
            engine,
            policy,
            infrastructure,
            sink,
            unavailable: UnavailablePolicy::default(),
            summary: IntakeSummary::default(),
        }
    }

    pub fn with_unavailable_policy(mut self, unavailable: UnavailablePolicy) -> Self {
        self.unavailable = unavailable;
        self
    }

    pub fn summary(&self) -> &IntakeSummary {
        &self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (S, IntakeSummary) {
        (self.sink, self.summary)
    }

    /// Handle one reading end to end. Every outcome is counted; a decision
    /// is forwarded to the sink before it is returned.
    pub fn process(&mut self, reading: &SensorReading) -> Result<PlacementDecision> {
        self.summary.readings_seen += 1;
        match self.place(reading) {
            Ok(decision) => {
                self.summary.dispatched += 1;
                self.sink.record(&decision);
                Ok(decision)
            }
            Err(err) => {
                self.summary.count_skip(&err);
                Err(err)
            }
        }
    }

    /// Drain a reading stream in order, skipping per-task failures.
    ///
    /// Any other error stops the run and is returned; readings after it are
    /// not consumed.
    pub fn run<I>(&mut self, readings: I) -> Result<IntakeSummary>
    where
        I: IntoIterator<Item = SensorReading>,
    {
        for reading in readings {
            match self.process(&reading) {
                Ok(_) => {}
                Err(err) if err.is_per_task() => {
                    warn!(
                        patient = %reading.patient_id,
                        device_id = reading.device_id,
                        timestamp = reading.timestamp,
                        error = %err,
                        "reading skipped"
                    );
                }
                Err(err) => {
                    error!(
                        patient = %reading.patient_id,
                        device_id = reading.device_id,
                        error = %err,
                        seen = self.summary.readings_seen,
                        "intake aborted"
                    );
                    return Err(err);
                }
            }
        }
        let s = &self.summary;
        info!(
            seen = s.readings_seen,
            dispatched = s.dispatched,
            patient_not_found = s.patient_not_found,
            malformed = s.malformed,
            scorer_unavailable = s.scorer_unavailable,
            fallback_scored = s.fallback_scored,
            unknown_device = s.unknown_device,
            critical_alerts = s.critical_alerts,
            "intake finished"
        );
        Ok(self.summary)
    }

    fn place(&mut self, reading: &SensorReading) -> Result<PlacementDecision> {
        let patient = self
            .registry
            .lookup(&reading.patient_id, reading.device_id)?;
        let mut task = HealthTask::from_reading(reading, patient)?;
        let edge = *self.infrastructure.edge_capacity(task.device_id)?;
        let cloud = *self.infrastructure.cloud_capacity();

        match self.engine.score(&mut task, patient) {
            Ok(_) => {}
            Err(VitalError::ScorerUnavailable(reason))
                if self.unavailable == UnavailablePolicy::FallbackToRules =>
            {
                warn!(
                    task_id = %task.id,
                    patient = %task.patient_id,
                    %reason,
                    "learned scorer unavailable, using rule-based score"
                );
                self.engine.score_with_rules(&mut task);
                self.summary.fallback_scored += 1;
            }
            Err(err) => return Err(err),
        }

        if self.policy.is_critical(task.urgency()) {
            self.summary.critical_alerts += 1;
            warn!(
                task_id = %task.id,
                patient = %task.patient_id,
                device_id = task.device_id,
                urgency = task.urgency(),
                heart_rate = task.heart_rate,
                blood_pressure = task.blood_pressure,
                glucose_level = task.glucose_level,
                "critical vitals, immediate attention required"
            );
        }

        Ok(self.policy.dispatch(&task, &edge, &cloud))
    }
}
