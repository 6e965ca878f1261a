//! Vital-sign parameters and the static tables scoring reads from.
//!
//! Tables are built and validated once before any scoring begins, then
//! shared read-only (typically behind an `Arc`) for the process lifetime.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalError};

/// Measured vital parameters, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalParameter {
    HeartRate,
    BloodPressure,
    GlucoseLevel,
}

impl VitalParameter {
    /// All parameters, highest tie-break priority first.
    pub const ALL: [VitalParameter; 3] = [
        VitalParameter::HeartRate,
        VitalParameter::BloodPressure,
        VitalParameter::GlucoseLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VitalParameter::HeartRate => "heart_rate",
            VitalParameter::BloodPressure => "blood_pressure",
            VitalParameter::GlucoseLevel => "glucose_level",
        }
    }
}

impl std::fmt::Display for VitalParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference interval for one parameter. `lower < upper` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalRange {
    lower: f64,
    upper: f64,
}

impl NormalRange {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(VitalError::ConfigInvariantViolation(format!(
                "normal range bounds must be finite, got ({}, {})",
                lower, upper
            )));
        }
        if lower >= upper {
            return Err(VitalError::ConfigInvariantViolation(format!(
                "normal range lower bound {} must be below upper bound {}",
                lower, upper
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Tie-break weight per parameter. Weights are pairwise distinct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterWeights {
    heart_rate: f64,
    blood_pressure: f64,
    glucose_level: f64,
}

impl ParameterWeights {
    pub fn new(heart_rate: f64, blood_pressure: f64, glucose_level: f64) -> Result<Self> {
        let weights = Self {
            heart_rate,
            blood_pressure,
            glucose_level,
        };
        for param in VitalParameter::ALL {
            let w = weights.weight_for(param);
            if !w.is_finite() {
                return Err(VitalError::ConfigInvariantViolation(format!(
                    "weight for {} must be finite, got {}",
                    param, w
                )));
            }
        }
        for (i, a) in VitalParameter::ALL.iter().enumerate() {
            for b in &VitalParameter::ALL[i + 1..] {
                if weights.weight_for(*a) == weights.weight_for(*b) {
                    return Err(VitalError::ConfigInvariantViolation(format!(
                        "parameter weights tie: {} and {} both {}",
                        a,
                        b,
                        weights.weight_for(*a)
                    )));
                }
            }
        }
        Ok(weights)
    }

    pub fn weight_for(&self, param: VitalParameter) -> f64 {
        match param {
            VitalParameter::HeartRate => self.heart_rate,
            VitalParameter::BloodPressure => self.blood_pressure,
            VitalParameter::GlucoseLevel => self.glucose_level,
        }
    }
}

impl Default for ParameterWeights {
    fn default() -> Self {
        Self {
            heart_rate: 3.0,
            blood_pressure: 2.0,
            glucose_level: 1.0,
        }
    }
}

/// Normal ranges and weights for all three parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringTables {
    heart_rate: NormalRange,
    blood_pressure: NormalRange,
    glucose_level: NormalRange,
    weights: ParameterWeights,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            heart_rate: NormalRange { lower: 60.0, upper: 100.0 },
            blood_pressure: NormalRange { lower: 90.0, upper: 120.0 },
            glucose_level: NormalRange { lower: 70.0, upper: 140.0 },
            weights: ParameterWeights::default(),
        }
    }
}

impl ScoringTables {
    pub fn new(
        heart_rate: NormalRange,
        blood_pressure: NormalRange,
        glucose_level: NormalRange,
        weights: ParameterWeights,
    ) -> Self {
        Self {
            heart_rate,
            blood_pressure,
            glucose_level,
            weights,
        }
    }

    pub fn range_for(&self, param: VitalParameter) -> &NormalRange {
        match param {
            VitalParameter::HeartRate => &self.heart_rate,
            VitalParameter::BloodPressure => &self.blood_pressure,
            VitalParameter::GlucoseLevel => &self.glucose_level,
        }
    }

    pub fn weights(&self) -> &ParameterWeights {
        &self.weights
    }

    /// Parse tables from TOML. Omitted keys keep their default values;
    /// every range and the weight ordering are validated.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawTables = toml::from_str(s)?;
        raw.build()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let tables = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded scoring tables");
        Ok(tables)
    }

    pub fn log_summary(&self) {
        for param in VitalParameter::ALL {
            let range = self.range_for(param);
            tracing::info!(
                "  {:<15} normal=({}, {}) weight={}",
                param.as_str(),
                range.lower(),
                range.upper(),
                self.weights.weight_for(param)
            );
        }
    }
}

// ── TOML-level types ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTables {
    #[serde(default)]
    ranges: RawRanges,
    #[serde(default)]
    weights: RawWeights,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRanges {
    heart_rate: Option<RawRange>,
    blood_pressure: Option<RawRange>,
    glucose_level: Option<RawRange>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRange {
    lower: f64,
    upper: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWeights {
    heart_rate: Option<f64>,
    blood_pressure: Option<f64>,
    glucose_level: Option<f64>,
}

impl RawTables {
    fn build(self) -> Result<ScoringTables> {
        let defaults = ScoringTables::default();
        let range = |raw: Option<RawRange>, fallback: NormalRange| match raw {
            Some(r) => NormalRange::new(r.lower, r.upper),
            None => Ok(fallback),
        };
        let dw = defaults.weights;
        let weights = ParameterWeights::new(
            self.weights.heart_rate.unwrap_or(dw.heart_rate),
            self.weights.blood_pressure.unwrap_or(dw.blood_pressure),
            self.weights.glucose_level.unwrap_or(dw.glucose_level),
        )?;
        Ok(ScoringTables {
            heart_rate: range(self.ranges.heart_rate, defaults.heart_rate)?,
            blood_pressure: range(self.ranges.blood_pressure, defaults.blood_pressure)?,
            glucose_level: range(self.ranges.glucose_level, defaults.glucose_level)?,
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_match_reference_ranges() {
        let t = ScoringTables::default();
        let hr = t.range_for(VitalParameter::HeartRate);
        assert_eq!((hr.lower(), hr.upper()), (60.0, 100.0));
        let bp = t.range_for(VitalParameter::BloodPressure);
        assert_eq!((bp.lower(), bp.upper()), (90.0, 120.0));
        let gl = t.range_for(VitalParameter::GlucoseLevel);
        assert_eq!((gl.lower(), gl.upper()), (70.0, 140.0));
        assert_eq!(t.weights().weight_for(VitalParameter::HeartRate), 3.0);
        assert_eq!(t.weights().weight_for(VitalParameter::BloodPressure), 2.0);
        assert_eq!(t.weights().weight_for(VitalParameter::GlucoseLevel), 1.0);
    }

    #[test]
    fn priority_order_is_hr_bp_glucose() {
        assert_eq!(
            VitalParameter::ALL,
            [
                VitalParameter::HeartRate,
                VitalParameter::BloodPressure,
                VitalParameter::GlucoseLevel
            ]
        );
    }

    #[test]
    fn normal_range_rejects_inverted_or_empty() {
        assert!(matches!(
            NormalRange::new(100.0, 60.0),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
        assert!(NormalRange::new(90.0, 90.0).is_err());
        assert!(NormalRange::new(f64::NAN, 90.0).is_err());
        assert_eq!(NormalRange::new(60.0, 100.0).unwrap().midpoint(), 80.0);
    }

    #[test]
    fn weights_reject_ties() {
        assert!(matches!(
            ParameterWeights::new(3.0, 3.0, 1.0),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
        assert!(ParameterWeights::new(1.0, 2.0, 1.0).is_err());
        assert!(ParameterWeights::new(5.0, 4.0, 3.0).is_ok());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let toml = r#"
[ranges.heart_rate]
lower = 50.0
upper = 90.0

[weights]
glucose_level = 0.5
"#;
        let t = ScoringTables::from_toml_str(toml).unwrap();
        assert_eq!(t.range_for(VitalParameter::HeartRate).lower(), 50.0);
        assert_eq!(t.range_for(VitalParameter::BloodPressure).upper(), 120.0);
        assert_eq!(t.weights().weight_for(VitalParameter::GlucoseLevel), 0.5);
        assert_eq!(t.weights().weight_for(VitalParameter::HeartRate), 3.0);
    }

    #[test]
    fn toml_inverted_range_is_invariant_violation() {
        let toml = r#"
[ranges.glucose_level]
lower = 140.0
upper = 70.0
"#;
        assert!(matches!(
            ScoringTables::from_toml_str(toml),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
    }

    #[test]
    fn toml_weight_tie_is_invariant_violation() {
        let toml = "[weights]\nblood_pressure = 3.0\n";
        assert!(matches!(
            ScoringTables::from_toml_str(toml),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
    }

    #[test]
    fn toml_unknown_key_is_parse_error() {
        let toml = "[ranges.temperature]\nlower = 36.0\nupper = 37.5\n";
        assert!(matches!(
            ScoringTables::from_toml_str(toml),
            Err(VitalError::Parse(_))
        ));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(
            ScoringTables::from_toml_str("").unwrap(),
            ScoringTables::default()
        );
    }
}
