use super::types::{ComparisonResult, DEFAULT_HORIZON_YEARS};

pub fn format_report(profile_name: &str, median: f64, p90: f64, p10: f64) -> String {
    format_report_for_horizon(profile_name, DEFAULT_HORIZON_YEARS, median, p90, p10)
}

pub fn format_report_for_horizon(
    profile_name: &str,
    horizon_years: u32,
    median: f64,
    p90: f64,
    p10: f64,
) -> String {
    format!(
        "Portfolio type: {profile_name}\n\
         Median {horizon_years} Yr: {median}\n\
         10% best case: {p90}\n\
         10% worse case: {p10}"
    )
}

/// One report per profile, in configuration order, separated by a blank line.
pub fn render_comparison(result: &ComparisonResult) -> String {
    result
        .profiles
        .iter()
        .map(|r| {
            format_report_for_horizon(
                &r.profile.name,
                result.horizon_years,
                r.summary.median,
                r.summary.p90,
                r.summary.p10,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
