use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use vitalroute_core::{HealthTask, Patient, PatientCategory, PriorityScore, ScoringTables, VitalError};

use super::learned::LearnedScorer;
use super::rule_based::RuleBasedScorer;

/// Routes each task to the scorer its patient category requires and
/// writes the result back onto the task.
#[derive(Debug, Clone)]
pub struct PriorityEngine {
    rules: RuleBasedScorer,
    learned: LearnedScorer,
}

impl PriorityEngine {
    pub fn new(tables: Arc<ScoringTables>, learned: LearnedScorer) -> Self {
        Self {
            rules: RuleBasedScorer::new(tables),
            learned,
        }
    }

    /// Engine whose learned path has no models; `specific` patients fail
    /// with `ScorerUnavailable`.
    pub fn rule_based_only(tables: Arc<ScoringTables>) -> Self {
        Self::new(tables, LearnedScorer::untrained())
    }

    pub fn rules(&self) -> &RuleBasedScorer {
        &self.rules
    }

    pub fn learned(&self) -> &LearnedScorer {
        &self.learned
    }

    /// Compute the score for the patient's category without touching the task.
    pub fn evaluate(&self, task: &HealthTask, patient: &Patient) -> Result<PriorityScore, VitalError> {
        match patient.category {
            PatientCategory::General => Ok(self.rules.score(task)),
            PatientCategory::Specific => self.learned.score(task, patient),
        }
    }

    /// Score the task and overwrite its urgency and weight. On error the
    /// task is left unchanged.
    pub fn score(&self, task: &mut HealthTask, patient: &Patient) -> Result<PriorityScore, VitalError> {
        let score = self.evaluate(task, patient)?;
        task.apply_score(score);
        debug!(
            task_id = %task.id,
            patient = %task.patient_id,
            category = %patient.category,
            urgency = score.urgency,
            weight = score.weight,
            "task scored"
        );
        Ok(score)
    }

    /// Score with the rule-based path regardless of category. Used when a
    /// caller opts to substitute rules for an unavailable learned model.
    pub fn score_with_rules(&self, task: &mut HealthTask) -> PriorityScore {
        let score = self.rules.score(task);
        task.apply_score(score);
        score
    }

    /// Score independent tasks in parallel. Results are index-aligned with
    /// the input and identical to scoring each task sequentially.
    pub fn score_batch(
        &self,
        batch: &mut [(HealthTask, &Patient)],
    ) -> Vec<Result<PriorityScore, VitalError>> {
        batch
            .par_iter_mut()
            .map(|(task, patient)| self.score(task, patient))
            .collect()
    }
}
