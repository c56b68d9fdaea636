use serde::{Deserialize, Serialize};

use super::error::SimError;

pub const DEFAULT_INITIAL_PRINCIPAL: f64 = 100_000.0;
pub const DEFAULT_HORIZON_YEARS: u32 = 20;
pub const DEFAULT_INFLATION_RATE: f64 = 0.035;
pub const DEFAULT_TRIALS: u32 = 10_000;
// Every trial holds one f64, so this caps an Outcome Set at 80 MB.
pub const MAX_TRIALS: u32 = 10_000_000;
pub const MAX_HORIZON_YEARS: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioProfile {
    pub name: String,
    #[serde(alias = "mean", alias = "mean_return")]
    pub mean_return: f64,
    #[serde(alias = "std", alias = "std_return")]
    pub std_return: f64,
}

impl PortfolioProfile {
    pub fn new(name: impl Into<String>, mean_return: f64, std_return: f64) -> Self {
        Self {
            name: name.into(),
            mean_return,
            std_return,
        }
    }

    pub fn aggressive() -> Self {
        Self::new("Aggressive", 0.094324, 0.15675)
    }

    pub fn very_conservative() -> Self {
        Self::new("Very Conservative", 0.06189, 0.063438)
    }
}

/// Every knob of a comparison run. Missing keys in a JSON document fall back
/// to the `Default` values, which reproduce the classic $100,000 / 20 year /
/// 3.5% inflation / 10,000 trial comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    #[serde(alias = "initial_principal")]
    pub initial_principal: f64,
    pub trials: u32,
    #[serde(alias = "horizon_years")]
    pub horizon_years: u32,
    #[serde(alias = "inflation_rate")]
    pub inflation_rate: f64,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub profiles: Vec<PortfolioProfile>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_principal: DEFAULT_INITIAL_PRINCIPAL,
            trials: DEFAULT_TRIALS,
            horizon_years: DEFAULT_HORIZON_YEARS,
            inflation_rate: DEFAULT_INFLATION_RATE,
            seed: None,
            parallel: false,
            profiles: vec![
                PortfolioProfile::aggressive(),
                PortfolioProfile::very_conservative(),
            ],
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.initial_principal.is_finite() || self.initial_principal <= 0.0 {
            return Err(SimError::invalid("initial_principal", "must be > 0"));
        }

        if self.trials < 1 || self.trials > MAX_TRIALS {
            return Err(SimError::invalid(
                "trials",
                format!("must be between 1 and {MAX_TRIALS}"),
            ));
        }

        if self.horizon_years < 1 || self.horizon_years > MAX_HORIZON_YEARS {
            return Err(SimError::invalid(
                "horizon_years",
                format!("must be between 1 and {MAX_HORIZON_YEARS}"),
            ));
        }

        if !self.inflation_rate.is_finite() || self.inflation_rate <= -1.0 {
            return Err(SimError::invalid("inflation_rate", "must be > -1"));
        }

        if self.profiles.is_empty() {
            return Err(SimError::invalid("profiles", "at least one profile is required"));
        }

        for profile in &self.profiles {
            if profile.name.trim().is_empty() {
                return Err(SimError::invalid("profiles.name", "must not be empty"));
            }
            if !profile.mean_return.is_finite() {
                return Err(SimError::invalid(
                    "profiles.mean_return",
                    format!("must be finite for profile {}", profile.name),
                ));
            }
            if !profile.std_return.is_finite() || profile.std_return < 0.0 {
                return Err(SimError::invalid(
                    "profiles.std_return",
                    format!("must be >= 0 for profile {}", profile.name),
                ));
            }
        }

        Ok(())
    }
}

/// Inflation-adjusted terminal values of every trial for one profile, in
/// trial-index order. Read-only once the driver has produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutcomeSet(Vec<f64>);

impl OutcomeSet {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

impl From<Vec<f64>> for OutcomeSet {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub median: f64,
    pub p90: f64,
    pub p10: f64,
    pub stdev: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResult {
    pub profile: PortfolioProfile,
    pub summary: SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub initial_principal: f64,
    pub horizon_years: u32,
    pub inflation_rate: f64,
    pub trials: u32,
    pub seed: u64,
    pub profiles: Vec<ProfileResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &SimulationConfig, expected_name: &str) {
        match config.validate() {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, expected_name),
            other => panic!("expected InvalidParameter({expected_name}), got {other:?}"),
        }
    }

    #[test]
    fn default_config_matches_classic_comparison() {
        let config = SimulationConfig::default();
        assert_eq!(config.initial_principal, 100_000.0);
        assert_eq!(config.horizon_years, 20);
        assert_eq!(config.inflation_rate, 0.035);
        assert_eq!(config.trials, 10_000);
        assert_eq!(config.seed, None);
        assert!(!config.parallel);

        let names: Vec<&str> = config.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Aggressive", "Very Conservative"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_principal() {
        let mut config = SimulationConfig::default();
        config.initial_principal = 0.0;
        assert_invalid(&config, "initial_principal");

        config.initial_principal = f64::NAN;
        assert_invalid(&config, "initial_principal");
    }

    #[test]
    fn validate_rejects_zero_trials_and_zero_horizon() {
        let mut config = SimulationConfig::default();
        config.trials = 0;
        assert_invalid(&config, "trials");

        let mut config = SimulationConfig::default();
        config.horizon_years = 0;
        assert_invalid(&config, "horizon_years");
    }

    #[test]
    fn validate_caps_trials_and_horizon() {
        let mut config = SimulationConfig::default();
        config.trials = MAX_TRIALS;
        config.horizon_years = MAX_HORIZON_YEARS;
        assert!(config.validate().is_ok());

        config.trials = u32::MAX;
        assert_invalid(&config, "trials");

        let mut config = SimulationConfig::default();
        config.horizon_years = MAX_HORIZON_YEARS + 1;
        assert_invalid(&config, "horizon_years");
    }

    #[test]
    fn validate_rejects_inflation_at_or_below_minus_one() {
        let mut config = SimulationConfig::default();
        config.inflation_rate = -1.0;
        assert_invalid(&config, "inflation_rate");

        config.inflation_rate = -0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_profiles() {
        let mut config = SimulationConfig::default();
        config.profiles.clear();
        assert_invalid(&config, "profiles");

        let mut config = SimulationConfig::default();
        config.profiles[1].std_return = -0.01;
        assert_invalid(&config, "profiles.std_return");

        let mut config = SimulationConfig::default();
        config.profiles[0].mean_return = f64::INFINITY;
        assert_invalid(&config, "profiles.mean_return");

        let mut config = SimulationConfig::default();
        config.profiles[0].name = "  ".to_string();
        assert_invalid(&config, "profiles.name");
    }

    #[test]
    fn config_json_fills_missing_keys_with_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"trials": 250, "inflation_rate": 0.02}"#)
                .expect("valid config json");
        assert_eq!(config.trials, 250);
        assert_eq!(config.inflation_rate, 0.02);
        assert_eq!(config.horizon_years, DEFAULT_HORIZON_YEARS);
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn config_json_accepts_custom_profiles() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"profiles": [{"name": "Balanced", "meanReturn": 0.07, "std": 0.1}]}"#,
        )
        .expect("valid config json");
        assert_eq!(config.profiles, vec![PortfolioProfile::new("Balanced", 0.07, 0.1)]);
    }

    #[test]
    fn outcome_set_serializes_as_plain_array() {
        let outcomes = OutcomeSet::from(vec![1.5, 2.0]);
        assert_eq!(serde_json::to_string(&outcomes).expect("json"), "[1.5,2.0]");
    }
}
