mod engine;
mod error;
mod report;
mod stats;
mod types;

pub use engine::{ReturnSource, adjust, run_comparison, run_trial, simulate, simulate_seeded};
pub use error::SimError;
pub use report::{format_report, format_report_for_horizon, render_comparison};
pub use stats::{percentile, summarize};
pub use types::{
    ComparisonResult, DEFAULT_HORIZON_YEARS, DEFAULT_INFLATION_RATE, DEFAULT_INITIAL_PRINCIPAL,
    DEFAULT_TRIALS, MAX_HORIZON_YEARS, MAX_TRIALS, OutcomeSet, PortfolioProfile, ProfileResult,
    SimulationConfig, SummaryStatistics,
};
