use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use tracing::{debug, info};

use super::error::SimError;
use super::stats::summarize;
use super::types::{
    ComparisonResult, OutcomeSet, PortfolioProfile, ProfileResult, SimulationConfig,
};

/// Normal-distributed annual returns. Every `rand::Rng` is one.
pub trait ReturnSource {
    fn next_return(&mut self, mean: f64, std: f64) -> f64;
}

impl<R: Rng> ReturnSource for R {
    fn next_return(&mut self, mean: f64, std: f64) -> f64 {
        let z: f64 = self.sample(StandardNormal);
        mean + std * z
    }
}

// Requires inflation_rate > -1, checked by SimulationConfig::validate.
pub fn adjust(future_value: f64, years: u32, inflation_rate: f64) -> f64 {
    future_value / (1.0 + inflation_rate).powf(f64::from(years))
}

pub fn run_trial<S: ReturnSource + ?Sized>(
    initial: f64,
    years: u32,
    mean: f64,
    std: f64,
    inflation_rate: f64,
    source: &mut S,
) -> f64 {
    let mut balance = initial;
    for _ in 0..years {
        balance *= 1.0 + source.next_return(mean, std);
    }
    adjust(balance, years, inflation_rate)
}

pub fn simulate<S: ReturnSource + ?Sized>(
    initial: f64,
    trials: u32,
    years: u32,
    mean: f64,
    std: f64,
    inflation_rate: f64,
    source: &mut S,
) -> OutcomeSet {
    let mut outcomes = Vec::with_capacity(trials as usize);
    for _ in 0..trials {
        outcomes.push(run_trial(initial, years, mean, std, inflation_rate, source));
    }
    OutcomeSet::from(outcomes)
}

// One ChaCha stream per trial, so parallel output equals sequential output.
pub fn simulate_seeded(
    config: &SimulationConfig,
    profile: &PortfolioProfile,
    stream_id: u32,
    seed: u64,
) -> OutcomeSet {
    let trial = |trial_id: u32| {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, stream_id, trial_id));
        run_trial(
            config.initial_principal,
            config.horizon_years,
            profile.mean_return,
            profile.std_return,
            config.inflation_rate,
            &mut rng,
        )
    };

    let outcomes: Vec<f64> = if config.parallel {
        (0..config.trials).into_par_iter().map(trial).collect()
    } else {
        (0..config.trials).map(trial).collect()
    };
    OutcomeSet::from(outcomes)
}

pub fn run_comparison(config: &SimulationConfig) -> Result<ComparisonResult, SimError> {
    config.validate()?;

    let seed = config
        .seed
        .unwrap_or_else(|| rand::thread_rng().next_u64());
    info!(
        seed,
        trials = config.trials,
        horizon_years = config.horizon_years,
        profiles = config.profiles.len(),
        parallel = config.parallel,
        "running portfolio comparison"
    );

    let mut profiles = Vec::with_capacity(config.profiles.len());
    for (stream_id, profile) in (0_u32..).zip(&config.profiles) {
        let outcomes = simulate_seeded(config, profile, stream_id, seed);
        let summary = summarize(&outcomes)?;
        debug!(
            profile = %profile.name,
            median = summary.median,
            p90 = summary.p90,
            p10 = summary.p10,
            stdev = summary.stdev,
            "profile summarized"
        );
        profiles.push(ProfileResult {
            profile: profile.clone(),
            summary,
        });
    }

    Ok(ComparisonResult {
        initial_principal: config.initial_principal,
        horizon_years: config.horizon_years,
        inflation_rate: config.inflation_rate,
        trials: config.trials,
        seed,
        profiles,
    })
}

fn derive_seed(base_seed: u64, stream_id: u32, trial_id: u32) -> u64 {
    let mixed = base_seed ^ ((stream_id as u64) << 32) ^ trial_id as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
