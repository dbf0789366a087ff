mod cache;
mod cli;
mod config;
mod http;
mod jobs;
mod service;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::http::HttpError;
use crate::jobs::JobError;
use crate::wiring::WiringError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    load_dotenv()?;
    let config = config::AppConfig::from_env()?;
    let state = wiring::build_state(config, &cli).await?;

    let job_state = state.clone();
    let jobs_task = tokio::spawn(async move { jobs::start(job_state).await });

    let addr = state.config.http_addr;
    info!(%addr, "http server starting");
    let served = http::serve(addr, state.clone(), shutdown_signal()).await;
    jobs_task.abort();

    let drain = state.config.shutdown_drain;
    let pending = state.background.in_flight();
    if pending > 0 {
        info!(pending, drain_secs = drain.as_secs(), "draining background cache tasks");
    }
    if tokio::time::timeout(drain, state.background.wait_idle())
        .await
        .is_err()
    {
        warn!(
            pending = state.background.in_flight(),
            "background tasks still running at shutdown"
        );
    }

    served?;
    match jobs_task.await {
        Ok(result) => result?,
        Err(err) if err.is_cancelled() => {}
        Err(err) => return Err(err.into()),
    }
    info!("shutdown complete");
    Ok(())
}

fn load_dotenv() -> Result<(), dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => {
            info!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
