use super::error::SimError;
use super::types::{OutcomeSet, SummaryStatistics};

// Percentiles interpolate linearly at rank p / 100 * (n - 1).
pub fn summarize(outcomes: &OutcomeSet) -> Result<SummaryStatistics, SimError> {
    if outcomes.is_empty() {
        return Err(SimError::InsufficientData);
    }

    let mut sorted = outcomes.as_slice().to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = mean(&sorted);
    Ok(SummaryStatistics {
        median: percentile_sorted(&sorted, 50.0),
        p90: percentile_sorted(&sorted, 90.0),
        p10: percentile_sorted(&sorted, 10.0),
        stdev: population_stdev(&sorted, mean),
        mean,
    })
}

pub fn percentile(values: &[f64], p: f64) -> Result<f64, SimError> {
    if values.is_empty() {
        return Err(SimError::InsufficientData);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(percentile_sorted(&sorted, p))
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        let (a, b) = (sorted[lower], sorted[upper]);
        // Monotone in `w` and never above `b`, so p10 <= median <= p90 holds.
        (a + (b - a) * w).min(b)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// Divides by N, not N - 1.
fn population_stdev(values: &[f64], mean: f64) -> f64 {
    let variance = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
