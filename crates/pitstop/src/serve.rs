// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pitstop serve`, `pitstop schedule` and `pitstop retry`.
//!
//! `serve` runs the HTTP gateway (Twilio webhooks plus the dashboard API)
//! and, unless disabled, the cron scheduler, until SIGINT/SIGTERM. The two
//! one-shot commands run a single batch and print its report as JSON.

use std::sync::Arc;

use chrono::Utc;
use pitstop_config::model::PitstopConfig;
use pitstop_core::{PitstopError, StorageAdapter};
use pitstop_cron::{BatchReport, SurveyJobs, run_scheduler};
use pitstop_gateway::{AuthConfig, GatewayState, WebhookAuth, start_server};
use pitstop_gemini::GeminiProvider;
use pitstop_sms::TwilioChannel;
use pitstop_storage::SqliteStorage;
use pitstop_survey::SurveyService;
use tracing::{error, info, warn};

use crate::shutdown;

/// A batch job runnable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Survey,
    Retry,
}

/// Adapters and the service built from config.
struct Runtime {
    storage: Arc<SqliteStorage>,
    service: Arc<SurveyService>,
}

async fn build_runtime(config: &PitstopConfig) -> Result<Runtime, PitstopError> {
    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    let provider = Arc::new(GeminiProvider::new(&config.gemini)?);
    let channel = Arc::new(TwilioChannel::new(&config.sms)?);

    let service = Arc::new(SurveyService::new(
        storage.clone(),
        channel,
        provider,
        config,
    ));
    Ok(Runtime { storage, service })
}

/// Runs the `pitstop serve` command.
pub async fn run_serve(config: PitstopConfig) -> Result<(), PitstopError> {
    init_tracing(&config.dealership.log_level);
    info!(dealership = %config.dealership.name, "starting pitstop serve");

    let runtime = build_runtime(&config).await?;

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set -- dashboard API will reject all requests");
    }
    let webhook = WebhookAuth::from_config(&config.sms);
    if !webhook.validate_signatures {
        warn!("Twilio signature validation is disabled");
    }
    let state = GatewayState::new(
        runtime.service.clone(),
        AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        webhook,
    );

    let cancel = shutdown::install_signal_handler();

    let scheduler = if config.scheduler.enabled {
        let jobs = Arc::new(SurveyJobs::new(
            runtime.service.clone(),
            config.scheduler.clone(),
        ));
        let sched_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = run_scheduler(jobs, sched_cancel.clone()).await {
                error!(error = %e, "scheduler stopped");
                sched_cancel.cancel();
            }
        }))
    } else {
        info!("scheduler disabled");
        None
    };

    let served = start_server(&config.gateway, state, cancel.clone()).await;
    // A bind failure must also stop the scheduler.
    cancel.cancel();

    if let Some(handle) = scheduler
        && let Err(e) = handle.await
    {
        warn!(error = %e, "scheduler task did not finish cleanly");
    }
    if let Err(e) = runtime.storage.close().await {
        warn!(error = %e, "failed to close storage");
    }

    served?;
    info!("pitstop serve shutdown complete");
    Ok(())
}

/// Runs one batch now and prints its report.
pub async fn run_job(config: PitstopConfig, job: Job) -> Result<(), PitstopError> {
    init_tracing(&config.dealership.log_level);

    let runtime = build_runtime(&config).await?;
    let jobs = SurveyJobs::new(runtime.service.clone(), config.scheduler.clone());
    let report = execute(&jobs, job).await;

    if let Err(e) = runtime.storage.close().await {
        warn!(error = %e, "failed to close storage");
    }

    let report = report?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| PitstopError::Internal(format!("failed to render report: {e}")))?;
    println!("{json}");
    Ok(())
}

async fn execute(jobs: &SurveyJobs, job: Job) -> Result<BatchReport, PitstopError> {
    match job {
        Job::Survey => jobs.run_survey_batch(Utc::now()).await,
        Job::Retry => jobs.run_retry_batch(Utc::now()).await,
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pitstop={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
