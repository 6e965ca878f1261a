use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalError};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    profiled_env_entry(profile, key).map(|(_, v)| v)
}

/// Like `profiled_env_opt`, but also returns the variable name that matched.
fn profiled_env_entry(profile: &str, key: &str) -> Option<(String, String)> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some((prefixed, v));
        }
    }
    env_opt(key).map(|v| (key.to_string(), v))
}

/// Parse a profiled env var when set. A value that is present but does not
/// parse is a config error naming the variable.
fn profiled_env_parsed<T>(profile: &str, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match profiled_env_entry(profile, key) {
        None => Ok(None),
        Some((name, raw)) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            VitalError::ConfigInvariantViolation(format!(
                "{}={:?} is not a valid value: {}",
                name, raw, e
            ))
        }),
    }
}

fn profiled_env_or<T>(profile: &str, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    Ok(profiled_env_parsed(profile, key)?.unwrap_or(default))
}

fn profiled_env_path(profile: &str, key: &str) -> Option<PathBuf> {
    profiled_env_opt(profile, key).map(PathBuf::from)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub dispatch: DispatchConfig,
    pub infrastructure: InfrastructureConfig,
    pub data: DataConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VITALROUTE_PROFILE` env var. When set (e.g. `STAGING`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("VITALROUTE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    /// Fails when a numeric key is set to something that does not parse.
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            dispatch: DispatchConfig::from_env_profiled(p)?,
            infrastructure: InfrastructureConfig::from_env_profiled(p)?,
            data: DataConfig::from_env_profiled(p),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check every section. Any failure is fatal before scoring starts.
    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()?;
        self.infrastructure.validate()
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  dispatch:       base={}s urgent>{} complex>{} jitter=[{}, {}] seed={}",
            self.dispatch.base_processing_time,
            self.dispatch.urgent_threshold,
            self.dispatch.high_complexity_threshold,
            self.dispatch.jitter_min,
            self.dispatch.jitter_max,
            self.dispatch
                .jitter_seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(entropy)".into())
        );
        tracing::info!(
            "  infrastructure: edge_devices={} edge_cpu={} cloud_cpu={}",
            self.infrastructure.edge_device_count,
            self.infrastructure.edge.cpu_cores,
            self.infrastructure.cloud.cpu_cores
        );
        tracing::info!(
            "  data:           patients={} readings={} models={}",
            display_path(&self.data.patients_path),
            display_path(&self.data.readings_path),
            display_path(&self.data.models_path)
        );
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".into())
}

// ── Dispatch ──────────────────────────────────────────────────

/// Placement thresholds and processing-time model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base processing time in seconds.
    pub base_processing_time: f64,
    /// Urgency strictly above this goes to the edge tier.
    pub urgent_threshold: f64,
    /// Urgency strictly above this uses the high complexity factor and raises an alert.
    pub high_complexity_threshold: f64,
    pub high_complexity_factor: f64,
    pub specific_complexity_factor: f64,
    pub edge_device_factor: f64,
    pub cloud_device_factor: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
    /// Fixed seed for reproducible jitter; `None` draws from entropy.
    pub jitter_seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_processing_time: 0.1,
            urgent_threshold: 1.0,
            high_complexity_threshold: 1.5,
            high_complexity_factor: 2.0,
            specific_complexity_factor: 1.5,
            edge_device_factor: 1.0,
            cloud_device_factor: 0.5,
            jitter_min: 0.8,
            jitter_max: 1.2,
            jitter_seed: None,
        }
    }
}

impl DispatchConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            base_processing_time: profiled_env_or(p, "BASE_PROCESSING_TIME", d.base_processing_time)?,
            urgent_threshold: profiled_env_or(p, "URGENT_THRESHOLD", d.urgent_threshold)?,
            high_complexity_threshold: profiled_env_or(
                p,
                "HIGH_COMPLEXITY_THRESHOLD",
                d.high_complexity_threshold,
            )?,
            high_complexity_factor: profiled_env_or(p, "HIGH_COMPLEXITY_FACTOR", d.high_complexity_factor)?,
            specific_complexity_factor: profiled_env_or(
                p,
                "SPECIFIC_COMPLEXITY_FACTOR",
                d.specific_complexity_factor,
            )?,
            edge_device_factor: profiled_env_or(p, "EDGE_DEVICE_FACTOR", d.edge_device_factor)?,
            cloud_device_factor: profiled_env_or(p, "CLOUD_DEVICE_FACTOR", d.cloud_device_factor)?,
            jitter_min: profiled_env_or(p, "JITTER_MIN", d.jitter_min)?,
            jitter_max: profiled_env_or(p, "JITTER_MAX", d.jitter_max)?,
            jitter_seed: profiled_env_parsed(p, "JITTER_SEED")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("base_processing_time", self.base_processing_time),
            ("high_complexity_factor", self.high_complexity_factor),
            ("specific_complexity_factor", self.specific_complexity_factor),
            ("edge_device_factor", self.edge_device_factor),
            ("cloud_device_factor", self.cloud_device_factor),
            ("jitter_min", self.jitter_min),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(VitalError::ConfigInvariantViolation(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !self.jitter_max.is_finite() || self.jitter_min > self.jitter_max {
            return Err(VitalError::ConfigInvariantViolation(format!(
                "jitter interval [{}, {}] is empty",
                self.jitter_min, self.jitter_max
            )));
        }
        if !(0.0..=2.0).contains(&self.urgent_threshold)
            || !(0.0..=2.0).contains(&self.high_complexity_threshold)
        {
            return Err(VitalError::ConfigInvariantViolation(format!(
                "thresholds must lie within the urgency scale [0, 2], got {} and {}",
                self.urgent_threshold, self.high_complexity_threshold
            )));
        }
        if self.urgent_threshold > self.high_complexity_threshold {
            return Err(VitalError::ConfigInvariantViolation(format!(
                "urgent_threshold {} exceeds high_complexity_threshold {}",
                self.urgent_threshold, self.high_complexity_threshold
            )));
        }
        Ok(())
    }
}

// ── Infrastructure ────────────────────────────────────────────

/// Static resources of one compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapacity {
    pub cpu_cores: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
    pub bandwidth_mbps: u32,
}

impl NodeCapacity {
    pub fn edge_default() -> Self {
        Self {
            cpu_cores: 8,
            memory_mb: 16_384,
            disk_mb: 500_000,
            bandwidth_mbps: 1_000,
        }
    }

    pub fn cloud_default() -> Self {
        Self {
            cpu_cores: 32,
            memory_mb: 65_536,
            disk_mb: 2_000_000,
            bandwidth_mbps: 10_000,
        }
    }

    fn from_env_profiled(p: &str, prefix: &str, d: Self) -> Result<Self> {
        Ok(Self {
            cpu_cores: profiled_env_or(p, &format!("{}_CPU_CORES", prefix), d.cpu_cores)?,
            memory_mb: profiled_env_or(p, &format!("{}_MEMORY_MB", prefix), d.memory_mb)?,
            disk_mb: profiled_env_or(p, &format!("{}_DISK_MB", prefix), d.disk_mb)?,
            bandwidth_mbps: profiled_env_or(p, &format!("{}_BANDWIDTH_MBPS", prefix), d.bandwidth_mbps)?,
        })
    }
}

/// Edge devices are numbered `1..=edge_device_count`; there is a single cloud tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureConfig {
    pub edge_device_count: u32,
    pub edge: NodeCapacity,
    pub cloud: NodeCapacity,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            edge_device_count: 2,
            edge: NodeCapacity::edge_default(),
            cloud: NodeCapacity::cloud_default(),
        }
    }
}

impl InfrastructureConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            edge_device_count: profiled_env_or(p, "EDGE_DEVICE_COUNT", d.edge_device_count)?,
            edge: NodeCapacity::from_env_profiled(p, "EDGE", d.edge)?,
            cloud: NodeCapacity::from_env_profiled(p, "CLOUD", d.cloud)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.edge_device_count == 0 {
            return Err(VitalError::ConfigInvariantViolation(
                "at least one edge device is required".into(),
            ));
        }
        Ok(())
    }
}

// ── Data sources ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub patients_path: Option<PathBuf>,
    pub readings_path: Option<PathBuf>,
    /// Externally trained model artifacts; absent means the learned path is untrained.
    pub models_path: Option<PathBuf>,
    pub scoring_tables_path: Option<PathBuf>,
}

impl DataConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            patients_path: profiled_env_path(p, "PATIENTS_PATH"),
            readings_path: profiled_env_path(p, "READINGS_PATH"),
            models_path: profiled_env_path(p, "MODELS_PATH"),
            scoring_tables_path: profiled_env_path(p, "SCORING_TABLES_PATH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_defaults() {
        let d = DispatchConfig::default();
        assert_eq!(d.base_processing_time, 0.1);
        assert_eq!(d.urgent_threshold, 1.0);
        assert_eq!(d.high_complexity_threshold, 1.5);
        assert_eq!(d.cloud_device_factor, 0.5);
        assert_eq!((d.jitter_min, d.jitter_max), (0.8, 1.2));
        assert!(d.jitter_seed.is_none());
        assert!(d.validate().is_ok());
    }

    #[test]
    fn dispatch_rejects_empty_jitter_interval() {
        let d = DispatchConfig {
            jitter_min: 1.3,
            jitter_max: 1.2,
            ..DispatchConfig::default()
        };
        assert!(matches!(d.validate(), Err(VitalError::ConfigInvariantViolation(_))));
    }

    #[test]
    fn dispatch_rejects_non_positive_factor() {
        let d = DispatchConfig {
            cloud_device_factor: 0.0,
            ..DispatchConfig::default()
        };
        assert!(d.validate().is_err());

        let d = DispatchConfig {
            base_processing_time: f64::NAN,
            ..DispatchConfig::default()
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn dispatch_rejects_inverted_thresholds() {
        let d = DispatchConfig {
            urgent_threshold: 1.6,
            ..DispatchConfig::default()
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn infrastructure_defaults() {
        let i = InfrastructureConfig::default();
        assert_eq!(i.edge_device_count, 2);
        assert_eq!(i.edge.cpu_cores, 8);
        assert_eq!(i.cloud.memory_mb, 65_536);
        assert!(i.validate().is_ok());

        let none = InfrastructureConfig {
            edge_device_count: 0,
            ..InfrastructureConfig::default()
        };
        assert!(none.validate().is_err());
    }

    #[test]
    fn profile_prefixed_key_wins() {
        // Keys are unique to this test; tests run in parallel.
        env::set_var("VRTEST_JITTER_SEED", "42");
        assert_eq!(
            profiled_env_opt("VRTEST", "JITTER_SEED").as_deref(),
            Some("42")
        );
        assert_eq!(profiled_env_or("VRTEST", "JITTER_SEED", 0u64).unwrap(), 42);
        assert_eq!(profiled_env_or("VRTEST", "MISSING_KEY_XYZ", 0.25).unwrap(), 0.25);
        env::remove_var("VRTEST_JITTER_SEED");
    }

    #[test]
    fn profile_label_defaults() {
        let c = Config::for_profile("VRLABEL_UNSET").unwrap();
        assert_eq!(c.profile_label(), "VRLABEL_UNSET");
        let c = Config {
            profile: String::new(),
            ..c
        };
        assert_eq!(c.profile_label(), "default");
    }

    #[test]
    fn malformed_numeric_values_are_rejected() {
        env::set_var("VRBADSEED_JITTER_SEED", "12x");
        let err = Config::for_profile("VRBADSEED").unwrap_err();
        match err {
            VitalError::ConfigInvariantViolation(msg) => {
                assert!(msg.contains("VRBADSEED_JITTER_SEED"), "{}", msg)
            }
            other => panic!("unexpected error: {other}"),
        }
        env::remove_var("VRBADSEED_JITTER_SEED");

        env::set_var("VRBADURGENT_URGENT_THRESHOLD", "1,2");
        assert!(matches!(
            Config::for_profile("VRBADURGENT"),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
        env::remove_var("VRBADURGENT_URGENT_THRESHOLD");

        env::set_var("VRBADEDGE_EDGE_DEVICE_COUNT", "three");
        assert!(matches!(
            Config::for_profile("VRBADEDGE"),
            Err(VitalError::ConfigInvariantViolation(_))
        ));
        env::remove_var("VRBADEDGE_EDGE_DEVICE_COUNT");
    }

    #[test]
    fn well_formed_profiled_values_are_read() {
        env::set_var("VRGOOD_JITTER_SEED", " 7 ");
        env::set_var("VRGOOD_EDGE_DEVICE_COUNT", "4");
        env::set_var("VRGOOD_CLOUD_DEVICE_FACTOR", "0.25");
        let c = Config::for_profile("vrgood").unwrap();
        assert_eq!(c.dispatch.jitter_seed, Some(7));
        assert_eq!(c.infrastructure.edge_device_count, 4);
        assert_eq!(c.dispatch.cloud_device_factor, 0.25);
        env::remove_var("VRGOOD_JITTER_SEED");
        env::remove_var("VRGOOD_EDGE_DEVICE_COUNT");
        env::remove_var("VRGOOD_CLOUD_DEVICE_FACTOR");
    }
}
