use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use vitalroute_core::{DeviceId, PatientCategory};

use crate::dispatch::{PlacementDecision, Target, Tier};

/// Receives every placement decision in dispatch order.
pub trait ReportingSink {
    fn record(&mut self, decision: &PlacementDecision);
}

impl ReportingSink for Vec<PlacementDecision> {
    fn record(&mut self, decision: &PlacementDecision) {
        self.push(decision.clone());
    }
}

/// Running mean without storing every sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Mean {
    pub count: u64,
    pub mean: f64,
}

impl Mean {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        // Incremental mean: new = prev + (x - prev) / n
        self.mean += (value - self.mean) / self.count as f64;
    }
}

/// Aggregated view of a simulation run plus the full decision history.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub generated_at: DateTime<Utc>,
    pub total_tasks: u64,
    pub edge_tasks: u64,
    pub cloud_tasks: u64,
    /// Tasks above the urgent threshold.
    pub urgent_tasks: u64,
    pub non_urgent_tasks: u64,
    /// Mean estimated processing time per tier.
    pub processing_time: BTreeMap<Tier, Mean>,
    pub by_category: BTreeMap<String, u64>,
    pub by_edge_device: BTreeMap<DeviceId, u64>,
    pub history: Vec<PlacementDecision>,
}

impl Default for SimulationReport {
    fn default() -> Self {
        Self {
            generated_at: Utc::now(),
            total_tasks: 0,
            edge_tasks: 0,
            cloud_tasks: 0,
            urgent_tasks: 0,
            non_urgent_tasks: 0,
            processing_time: BTreeMap::new(),
            by_category: BTreeMap::new(),
            by_edge_device: BTreeMap::new(),
            history: Vec::new(),
        }
    }
}

impl SimulationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn average_processing_time(&self, tier: Tier) -> Option<f64> {
        self.processing_time
            .get(&tier)
            .filter(|m| m.count > 0)
            .map(|m| m.mean)
    }

    pub fn category_count(&self, category: PatientCategory) -> u64 {
        self.by_category
            .get(&category.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn log_summary(&self) {
        info!(
            total = self.total_tasks,
            edge = self.edge_tasks,
            cloud = self.cloud_tasks,
            urgent = self.urgent_tasks,
            non_urgent = self.non_urgent_tasks,
            "simulation summary"
        );
        for (tier, mean) in &self.processing_time {
            info!(%tier, tasks = mean.count, avg_seconds = mean.mean, "processing time");
        }
        for (category, count) in &self.by_category {
            info!(%category, count, "category distribution");
        }
        for (device_id, count) in &self.by_edge_device {
            info!(device_id, count, "edge device load");
        }
    }
}

impl ReportingSink for SimulationReport {
    fn record(&mut self, decision: &PlacementDecision) {
        self.total_tasks += 1;
        match decision.target {
            Target::Edge { device_id } => {
                self.edge_tasks += 1;
                self.urgent_tasks += 1;
                *self.by_edge_device.entry(device_id).or_default() += 1;
            }
            Target::Cloud => {
                self.cloud_tasks += 1;
                self.non_urgent_tasks += 1;
            }
        }
        self.processing_time
            .entry(decision.tier())
            .or_default()
            .push(decision.processing_time);
        *self
            .by_category
            .entry(decision.category.to_string())
            .or_default() += 1;
        self.history.push(decision.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn decision(target: Target, category: PatientCategory, time: f64) -> PlacementDecision {
        let urgency = match target {
            Target::Edge { .. } => 1.4,
            Target::Cloud => 0.6,
        };
        PlacementDecision {
            task_id: Uuid::new_v4(),
            patient_id: "P1".into(),
            device_id: 1,
            category,
            heart_rate: 72,
            blood_pressure: 120,
            glucose_level: 95.0,
            timestamp: 0.0,
            urgency,
            weight: 2.0,
            target,
            complexity_factor: 1.0,
            processing_time: time,
        }
    }

    #[test]
    fn mean_is_incremental() {
        let mut m = Mean::default();
        for x in [0.1, 0.2, 0.3] {
            m.push(x);
        }
        assert_eq!(m.count, 3);
        assert!((m.mean - 0.2).abs() < 1e-12);
    }

    #[test]
    fn counts_and_averages_by_tier() {
        let mut report = SimulationReport::new();
        report.record(&decision(Target::Edge { device_id: 1 }, PatientCategory::General, 0.1));
        report.record(&decision(Target::Edge { device_id: 2 }, PatientCategory::Specific, 0.3));
        report.record(&decision(Target::Cloud, PatientCategory::General, 0.05));

        assert_eq!(report.total_tasks, 3);
        assert_eq!(report.edge_tasks, 2);
        assert_eq!(report.cloud_tasks, 1);
        assert_eq!(report.urgent_tasks, 2);
        assert_eq!(report.non_urgent_tasks, 1);
        assert!((report.average_processing_time(Tier::Edge).unwrap() - 0.2).abs() < 1e-12);
        assert!((report.average_processing_time(Tier::Cloud).unwrap() - 0.05).abs() < 1e-12);
        assert_eq!(report.category_count(PatientCategory::General), 2);
        assert_eq!(report.category_count(PatientCategory::Specific), 1);
        assert_eq!(report.by_edge_device.get(&1), Some(&1));
        assert_eq!(report.by_edge_device.get(&2), Some(&1));
    }

    #[test]
    fn empty_report_has_no_averages() {
        let report = SimulationReport::new();
        assert_eq!(report.average_processing_time(Tier::Edge), None);
        assert_eq!(report.category_count(PatientCategory::General), 0);
    }

    #[test]
    fn history_preserves_order() {
        let mut report = SimulationReport::new();
        let first = decision(Target::Cloud, PatientCategory::General, 0.05);
        let second = decision(Target::Edge { device_id: 1 }, PatientCategory::General, 0.1);
        report.record(&first);
        report.record(&second);
        assert_eq!(report.history, vec![first, second]);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = SimulationReport::new();
        report.record(&decision(Target::Edge { device_id: 2 }, PatientCategory::Specific, 0.15));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_tasks"], 1);
        assert_eq!(json["processing_time"]["edge"]["count"], 1);
        assert_eq!(json["by_edge_device"]["2"], 1);
        assert_eq!(json["history"][0]["target"]["tier"], "edge");
    }

    #[test]
    fn vec_sink_collects_decisions() {
        let mut sink: Vec<PlacementDecision> = Vec::new();
        let d = decision(Target::Cloud, PatientCategory::General, 0.05);
        sink.record(&d);
        assert_eq!(sink, vec![d]);
    }
}
