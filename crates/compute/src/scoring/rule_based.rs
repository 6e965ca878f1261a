use std::sync::Arc;

use vitalroute_core::{HealthTask, PriorityScore, ScoringTables, VitalParameter};

use super::urgency::range_urgency;

/// Urgency of each parameter for one task, in tie-break priority order.
pub type ParameterUrgencies = [(VitalParameter, f64); 3];

/// Worst-parameter-dominates scorer for `general` patients.
#[derive(Debug, Clone)]
pub struct RuleBasedScorer {
    tables: Arc<ScoringTables>,
}

impl RuleBasedScorer {
    pub fn new(tables: Arc<ScoringTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    pub fn parameter_urgencies(&self, task: &HealthTask) -> ParameterUrgencies {
        VitalParameter::ALL.map(|param| {
            let value = match param {
                VitalParameter::HeartRate => f64::from(task.heart_rate),
                VitalParameter::BloodPressure => f64::from(task.blood_pressure),
                VitalParameter::GlucoseLevel => task.glucose_level,
            };
            (param, range_urgency(value, self.tables.range_for(param)))
        })
    }

    /// Parameter that attained the maximum urgency. The first parameter in
    /// priority order wins a tie.
    pub fn dominant(urgencies: &ParameterUrgencies) -> (VitalParameter, f64) {
        let mut best = urgencies[0];
        for &(param, u) in &urgencies[1..] {
            if u > best.1 {
                best = (param, u);
            }
        }
        best
    }

    /// Overall urgency is the maximum parameter urgency; the weight is that
    /// parameter's table weight.
    pub fn score(&self, task: &HealthTask) -> PriorityScore {
        let urgencies = self.parameter_urgencies(task);
        let (param, urgency) = Self::dominant(&urgencies);
        PriorityScore {
            urgency,
            weight: self.tables.weights().weight_for(param),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalroute_core::PatientCategory;

    fn scorer() -> RuleBasedScorer {
        RuleBasedScorer::new(Arc::new(ScoringTables::default()))
    }

    fn task(hr: u32, bp: u32, glucose: f64) -> HealthTask {
        HealthTask::new("P999", hr, bp, glucose, PatientCategory::General)
    }

    #[test]
    fn critical_heart_rate_dominates() {
        let s = scorer();
        let t = task(180, 120, 95.0);
        let urgencies = s.parameter_urgencies(&t);
        let score = s.score(&t);
        assert_eq!(score.urgency, urgencies[0].1);
        assert_eq!(score.urgency, 2.0);
        assert_eq!(score.weight, 3.0);
    }

    #[test]
    fn high_blood_pressure_dominates() {
        let score = scorer().score(&task(72, 180, 95.0));
        assert_eq!(score.urgency, 2.0);
        assert_eq!(score.weight, 2.0);
    }

    #[test]
    fn high_glucose_dominates() {
        // 250 mg/dL: |110^2 - 180^2| / 70^2 = 4.18.. -> saturated
        let score = scorer().score(&task(80, 105, 250.0));
        assert_eq!(score.urgency, 2.0);
        assert_eq!(score.weight, 1.0);
    }

    #[test]
    fn bp_at_bound_beats_normal_hr_and_glucose() {
        // HR 0.4, BP 1.0, glucose 0.2857
        let score = scorer().score(&task(72, 120, 95.0));
        assert!((score.urgency - 1.0).abs() < 1e-12);
        assert_eq!(score.weight, 2.0);
    }

    #[test]
    fn all_centered_ties_resolve_to_heart_rate() {
        let score = scorer().score(&task(80, 105, 105.0));
        assert_eq!(score.urgency, 0.0);
        assert_eq!(score.weight, 3.0);
    }

    #[test]
    fn saturated_tie_resolves_to_heart_rate() {
        for _ in 0..10 {
            let score = scorer().score(&task(200, 200, 95.0));
            assert_eq!(score.urgency, 2.0);
            assert_eq!(score.weight, 3.0);
        }
    }

    #[test]
    fn bp_glucose_tie_resolves_to_blood_pressure() {
        // Both at their upper bound -> urgency 1.0 each; HR centered.
        let score = scorer().score(&task(80, 120, 140.0));
        assert!((score.urgency - 1.0).abs() < 1e-12);
        assert_eq!(score.weight, 2.0);
    }

    #[test]
    fn dominant_prefers_earlier_parameter_on_equal_values() {
        let urgencies = [
            (VitalParameter::HeartRate, 0.5),
            (VitalParameter::BloodPressure, 0.5),
            (VitalParameter::GlucoseLevel, 0.5),
        ];
        assert_eq!(
            RuleBasedScorer::dominant(&urgencies),
            (VitalParameter::HeartRate, 0.5)
        );
    }

    #[test]
    fn custom_weights_are_used() {
        let tables = ScoringTables::from_toml_str("[weights]\nheart_rate = 10.0\n").unwrap();
        let s = RuleBasedScorer::new(Arc::new(tables));
        assert_eq!(s.score(&task(180, 105, 105.0)).weight, 10.0);
    }
}
