use tracing::debug;
use vitalroute_core::config::{DispatchConfig, NodeCapacity};
use vitalroute_core::{HealthTask, PatientCategory, VitalError};

use super::jitter::JitterSource;
use super::types::{PlacementDecision, Target, Tier};

/// Threshold placement plus a multiplicative processing-time model.
///
/// Each call is an independent decision: no queueing, admission control or
/// capacity accounting.
#[derive(Debug, Clone)]
pub struct DispatchPolicy<J: JitterSource> {
    config: DispatchConfig,
    jitter: J,
}

impl<J: JitterSource> DispatchPolicy<J> {
    pub fn new(config: DispatchConfig, jitter: J) -> Result<Self, VitalError> {
        config.validate()?;
        Ok(Self { config, jitter })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Edge only when urgency is strictly above the urgent threshold.
    pub fn tier_for(&self, urgency: f64) -> Tier {
        if urgency > self.config.urgent_threshold {
            Tier::Edge
        } else {
            Tier::Cloud
        }
    }

    /// First matching rule wins: high urgency, then `specific`, then 1.0.
    pub fn complexity_factor(&self, urgency: f64, category: PatientCategory) -> f64 {
        if urgency > self.config.high_complexity_threshold {
            self.config.high_complexity_factor
        } else if category == PatientCategory::Specific {
            self.config.specific_complexity_factor
        } else {
            1.0
        }
    }

    pub fn device_factor(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Edge => self.config.edge_device_factor,
            Tier::Cloud => self.config.cloud_device_factor,
        }
    }

    /// Whether an urgency needs immediate attention.
    pub fn is_critical(&self, urgency: f64) -> bool {
        urgency > self.config.high_complexity_threshold
    }

    /// Place a scored task and estimate its processing time.
    ///
    /// Capacities are part of the interface but are not checked against load.
    pub fn dispatch(
        &mut self,
        task: &HealthTask,
        _edge: &NodeCapacity,
        _cloud: &NodeCapacity,
    ) -> PlacementDecision {
        let urgency = task.urgency();
        let tier = self.tier_for(urgency);
        let target = match tier {
            Tier::Edge => Target::Edge {
                device_id: task.device_id,
            },
            Tier::Cloud => Target::Cloud,
        };

        let complexity_factor = self.complexity_factor(urgency, task.category);
        let jitter = self.jitter.next_multiplier();
        let processing_time = self.config.base_processing_time
            * complexity_factor
            * self.device_factor(tier)
            * jitter;

        debug!(
            task_id = %task.id,
            %tier,
            urgency,
            complexity_factor,
            jitter,
            processing_time,
            "task placed"
        );

        PlacementDecision {
            task_id: task.id,
            patient_id: task.patient_id.clone(),
            device_id: task.device_id,
            category: task.category,
            heart_rate: task.heart_rate,
            blood_pressure: task.blood_pressure,
            glucose_level: task.glucose_level,
            timestamp: task.timestamp,
            urgency,
            weight: task.weight(),
            target,
            complexity_factor,
            processing_time,
        }
    }
}
