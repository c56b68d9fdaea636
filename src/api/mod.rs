use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::core::{
    ComparisonResult, PortfolioProfile, SimError, SimulationConfig, render_comparison,
    run_comparison,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid --profile: {0}")]
    Profile(String),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON simulation API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-mc",
    about = "Monte Carlo comparison of inflation-adjusted terminal wealth for portfolio profiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
    #[arg(long, help = "JSON configuration file; flags override its values")]
    config: Option<PathBuf>,
    #[arg(long, help = "Starting balance, e.g. 100000")]
    initial_principal: Option<f64>,
    #[arg(long, help = "Number of independent trials per profile")]
    trials: Option<u32>,
    #[arg(long, help = "Years of compounding per trial")]
    horizon_years: Option<u32>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Constant annual inflation as a decimal, e.g. 0.035"
    )]
    inflation_rate: Option<f64>,
    #[arg(long, help = "RNG seed; a random seed is drawn when omitted")]
    seed: Option<u64>,
    #[arg(long, help = "Spread trials across all CPU cores")]
    parallel: bool,
    #[arg(
        long = "profile",
        value_name = "NAME:MEAN:STD",
        value_parser = parse_profile,
        help = "Portfolio profile with decimal mean/std of annual returns; repeat to compare several"
    )]
    profiles: Vec<PortfolioProfile>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulateQuery {
    #[serde(alias = "initial_principal")]
    initial_principal: Option<f64>,
    trials: Option<u32>,
    #[serde(alias = "horizon_years")]
    horizon_years: Option<u32>,
    #[serde(alias = "inflation_rate")]
    inflation_rate: Option<f64>,
    seed: Option<u64>,
    parallel: Option<bool>,
}

impl SimulateQuery {
    fn into_config(self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        if let Some(value) = self.initial_principal {
            config.initial_principal = value;
        }
        if let Some(value) = self.trials {
            config.trials = value;
        }
        if let Some(value) = self.horizon_years {
            config.horizon_years = value;
        }
        if let Some(value) = self.inflation_rate {
            config.inflation_rate = value;
        }
        if let Some(value) = self.parallel {
            config.parallel = value;
        }
        config.seed = self.seed;
        config
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    #[serde(flatten)]
    result: ComparisonResult,
    report: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn parse_profile(raw: &str) -> Result<PortfolioProfile, AppError> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(std_dev), Some(mean), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::Profile(format!(
            "expected NAME:MEAN:STD, got `{raw}`"
        )));
    };

    let number = |label: &str, value: &str| {
        value.trim().parse::<f64>().map_err(|_| {
            AppError::Profile(format!("{label} `{value}` is not a number in `{raw}`"))
        })
    };
    Ok(PortfolioProfile::new(
        name.trim(),
        number("mean", mean)?,
        number("std", std_dev)?,
    ))
}

pub fn load_config_file(path: &Path) -> Result<SimulationConfig, AppError> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn build_config(cli: &Cli) -> Result<SimulationConfig, AppError> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(value) = cli.initial_principal {
        config.initial_principal = value;
    }
    if let Some(value) = cli.trials {
        config.trials = value;
    }
    if let Some(value) = cli.horizon_years {
        config.horizon_years = value;
    }
    if let Some(value) = cli.inflation_rate {
        config.inflation_rate = value;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if !cli.profiles.is_empty() {
        config.profiles = cli.profiles.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Runs the comparison described by `cli` and renders it in the requested
/// format. The caller decides where the text goes.
pub fn run_cli(cli: &Cli) -> Result<String, AppError> {
    let config = build_config(cli)?;
    let result = run_comparison(&config)?;
    match cli.format {
        OutputFormat::Text => Ok(render_comparison(&result)),
        OutputFormat::Json => serde_json::to_string_pretty(&result).map_err(AppError::Encode),
    }
}

fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    println!("portfolio-mc HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, router()).await?;
    Ok(())
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(query): Query<SimulateQuery>) -> Response {
    simulate_handler_impl(query.into_config()).await
}

async fn simulate_post_handler(Json(config): Json<SimulationConfig>) -> Response {
    simulate_handler_impl(config).await
}

async fn simulate_handler_impl(config: SimulationConfig) -> Response {
    debug!(
        trials = config.trials,
        profiles = config.profiles.len(),
        "simulate request"
    );
    let outcome = tokio::task::spawn_blocking(move || run_comparison(&config)).await;

    match outcome {
        Ok(Ok(result)) => {
            let report = render_comparison(&result);
            json_response(StatusCode::OK, SimulateResponse { result, report })
        }
        Ok(Err(err)) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        Err(err) => {
            error!(error = %err, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
