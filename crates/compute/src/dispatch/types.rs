use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vitalroute_core::config::{InfrastructureConfig, NodeCapacity};
use vitalroute_core::{DeviceId, PatientCategory, TaskId, VitalError};

/// Execution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Low-latency, limited-capacity local compute.
    Edge,
    /// Higher-latency, higher-capacity remote compute.
    Cloud,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Edge => write!(f, "edge"),
            Tier::Cloud => write!(f, "cloud"),
        }
    }
}

/// Concrete placement target. Edge placements always go to the task's
/// own source device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "lowercase")]
pub enum Target {
    Edge { device_id: DeviceId },
    Cloud,
}

impl Target {
    pub fn tier(&self) -> Tier {
        match self {
            Target::Edge { .. } => Tier::Edge,
            Target::Cloud => Tier::Cloud,
        }
    }
}

/// Outcome of dispatching one scored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDecision {
    pub task_id: TaskId,
    pub patient_id: String,
    pub device_id: DeviceId,
    pub category: PatientCategory,
    pub heart_rate: u32,
    pub blood_pressure: u32,
    pub glucose_level: f64,
    pub timestamp: f64,
    pub urgency: f64,
    pub weight: f64,
    pub target: Target,
    pub complexity_factor: f64,
    /// Estimated processing duration in seconds.
    pub processing_time: f64,
}

impl PlacementDecision {
    pub fn tier(&self) -> Tier {
        self.target.tier()
    }
}

/// Capacity snapshot of every edge device plus the cloud tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Infrastructure {
    edge: BTreeMap<DeviceId, NodeCapacity>,
    cloud: NodeCapacity,
}

impl Infrastructure {
    pub fn new(edge: BTreeMap<DeviceId, NodeCapacity>, cloud: NodeCapacity) -> Self {
        Self { edge, cloud }
    }

    /// Devices `1..=edge_device_count`, all with the configured edge capacity.
    pub fn from_config(config: &InfrastructureConfig) -> Self {
        let edge = (1..=config.edge_device_count)
            .map(|id| (id, config.edge))
            .collect();
        Self::new(edge, config.cloud)
    }

    pub fn edge_capacity(&self, device_id: DeviceId) -> Result<&NodeCapacity, VitalError> {
        self.edge
            .get(&device_id)
            .ok_or(VitalError::UnknownDevice(device_id))
    }

    pub fn cloud_capacity(&self) -> &NodeCapacity {
        &self.cloud
    }

    pub fn edge_device_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.edge.keys().copied()
    }
}
