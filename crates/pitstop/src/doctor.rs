// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pitstop doctor` command implementation.
//!
//! Runs diagnostic checks against the Pitstop environment: configuration,
//! the survey database, credentials for Gemini and Twilio, webhook and
//! dashboard security settings, and whether a gateway is already running.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use pitstop_config::model::PitstopConfig;
use pitstop_core::PitstopError;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `pitstop doctor` command. With `plain`, disables colored output.
pub async fn run_doctor(config: &PitstopConfig, plain: bool) -> Result<(), PitstopError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = vec![
        check_config(),
        check_database(&config.storage.database_path).await,
        check_db_integrity(&config.storage.database_path).await,
        check_gemini_credentials(config),
        check_twilio_credentials(config),
        check_webhook_security(config),
        check_dashboard_auth(config),
        check_health_endpoint(config).await,
        check_memory_baseline(),
    ];

    println!();
    println!("  pitstop doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(PitstopError::Internal(format!(
            "{fail_count} doctor check(s) failed"
        )));
    }
    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check configuration loads without errors.
fn check_config() -> CheckResult {
    let start = Instant::now();
    match pitstop_config::load_and_validate() {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check database file exists and answers a query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start);
        }
    };
    let surveys: Result<i64, tokio_rusqlite::Error<rusqlite::Error>> = conn
        .call(|conn| -> rusqlite::Result<i64> {
            conn.query_row("SELECT COUNT(*) FROM surveys", [], |row| row.get(0))
        })
        .await;
    match surveys {
        Ok(n) => CheckResult::new(
            "Database",
            CheckStatus::Pass,
            format!("connected ({n} surveys)"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

/// SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "DB integrity",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };
    let result: Result<Vec<String>, tokio_rusqlite::Error<rusqlite::Error>> = conn
        .call(|conn| -> rusqlite::Result<Vec<String>> {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await;

    match result {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

fn present(config_value: &Option<String>, env_vars: &[&str]) -> bool {
    config_value.as_deref().is_some_and(|v| !v.is_empty())
        || env_vars
            .iter()
            .any(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()))
}

/// Gemini API key from config or environment.
fn check_gemini_credentials(config: &PitstopConfig) -> CheckResult {
    let start = Instant::now();
    if present(&config.gemini.api_key, &["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]) {
        CheckResult::new(
            "Gemini",
            CheckStatus::Pass,
            format!("API key set (model {})", config.gemini.model),
            start,
        )
    } else {
        CheckResult::new(
            "Gemini",
            CheckStatus::Fail,
            "no API key (set gemini.api_key or GEMINI_API_KEY)",
            start,
        )
    }
}

/// Twilio account SID, auth token and sending number.
fn check_twilio_credentials(config: &PitstopConfig) -> CheckResult {
    let start = Instant::now();
    let sms = &config.sms;
    let missing: Vec<&str> = [
        ("account_sid", present(&sms.account_sid, &["TWILIO_ACCOUNT_SID"])),
        ("auth_token", present(&sms.auth_token, &["TWILIO_AUTH_TOKEN"])),
        ("from_number", present(&sms.from_number, &["TWILIO_PHONE_NUMBER"])),
    ]
    .into_iter()
    .filter(|(_, ok)| !ok)
    .map(|(key, _)| key)
    .collect();

    if missing.is_empty() {
        CheckResult::new("Twilio", CheckStatus::Pass, "credentials set", start)
    } else {
        CheckResult::new(
            "Twilio",
            CheckStatus::Fail,
            format!("missing sms.{}", missing.join(", sms.")),
            start,
        )
    }
}

/// Signature validation needs the public URL Twilio posts to.
fn check_webhook_security(config: &PitstopConfig) -> CheckResult {
    let start = Instant::now();
    let sms = &config.sms;
    if !sms.validate_signatures {
        return CheckResult::new(
            "Webhook signatures",
            CheckStatus::Warn,
            "validation disabled",
            start,
        );
    }
    if sms.public_base_url.as_deref().is_none_or(str::is_empty) {
        return CheckResult::new(
            "Webhook signatures",
            CheckStatus::Fail,
            "sms.public_base_url unset -- every webhook will be rejected",
            start,
        );
    }
    CheckResult::new("Webhook signatures", CheckStatus::Pass, "validated", start)
}

fn check_dashboard_auth(config: &PitstopConfig) -> CheckResult {
    let start = Instant::now();
    match config.gateway.bearer_token.as_deref() {
        Some(t) if !t.is_empty() => {
            CheckResult::new("Dashboard auth", CheckStatus::Pass, "bearer token set", start)
        }
        _ => CheckResult::new(
            "Dashboard auth",
            CheckStatus::Warn,
            "no bearer token -- dashboard API rejects all requests",
            start,
        ),
    }
}

/// Check whether a gateway already answers on the configured address.
async fn check_health_endpoint(config: &PitstopConfig) -> CheckResult {
    let start = Instant::now();
    let url = format!(
        "http://{}:{}/health",
        config.gateway.host, config.gateway.port
    );

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::new(
                "Health endpoint",
                CheckStatus::Fail,
                format!("HTTP client error: {e}"),
                start,
            );
        }
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            CheckResult::new("Health endpoint", CheckStatus::Pass, "reachable", start)
        }
        Ok(resp) => CheckResult::new(
            "Health endpoint",
            CheckStatus::Warn,
            format!("status {}", resp.status()),
            start,
        ),
        Err(_) => CheckResult::new(
            "Health endpoint",
            CheckStatus::Warn,
            format!("not reachable at {url} (gateway may not be running)"),
            start,
        ),
    }
}

/// Memory baseline via jemalloc.
fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_database_missing_warns() {
        let result = check_database("/tmp/nonexistent-pitstop-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn check_database_counts_surveys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doctor.db");
        let path = path.to_string_lossy().to_string();
        pitstop_storage::Database::open(&path)
            .await
            .unwrap()
            .close()
            .await
            .unwrap();

        let result = check_database(&path).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.contains("0 surveys"));
        assert_eq!(check_db_integrity(&path).await.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn check_db_integrity_missing_warns() {
        let result = check_db_integrity("/tmp/nonexistent-pitstop-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn webhook_security_requires_public_url() {
        let mut config = PitstopConfig::default();
        assert_eq!(check_webhook_security(&config).status, CheckStatus::Fail);

        config.sms.public_base_url = Some("https://surveys.example.com".into());
        assert_eq!(check_webhook_security(&config).status, CheckStatus::Pass);

        config.sms.validate_signatures = false;
        assert_eq!(check_webhook_security(&config).status, CheckStatus::Warn);
    }

    #[test]
    fn dashboard_without_token_warns() {
        let mut config = PitstopConfig::default();
        assert_eq!(check_dashboard_auth(&config).status, CheckStatus::Warn);
        config.gateway.bearer_token = Some("t".into());
        assert_eq!(check_dashboard_auth(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn twilio_check_names_missing_keys_from_config() {
        let mut config = PitstopConfig::default();
        config.sms.account_sid = Some("AC1".into());
        config.sms.auth_token = Some("tok".into());
        config.sms.from_number = Some("+15559990000".into());
        assert_eq!(check_twilio_credentials(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn plain_rendering_uses_tags() {
        let result = CheckResult {
            name: "Gemini".to_string(),
            status: CheckStatus::Fail,
            message: "no API key".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("no API key (3ms)"));
    }

    #[test]
    fn check_memory_baseline_reports() {
        let result = check_memory_baseline();
        assert!(result.status == CheckStatus::Pass || result.status == CheckStatus::Warn);
    }
}
