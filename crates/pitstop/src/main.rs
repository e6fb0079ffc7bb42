// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pitstop - SMS customer-satisfaction surveys for automotive service visits.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use clap::{Parser, Subcommand};
use pitstop_config::model::PitstopConfig;
use pitstop_core::PitstopError;

/// Pitstop - SMS customer-satisfaction surveys for automotive service visits.
#[derive(Parser, Debug)]
#[command(name = "pitstop", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook/dashboard gateway and the survey scheduler.
    Serve,
    /// Send first survey messages for eligible visits now, then exit.
    Schedule,
    /// Resend failed messages now, then exit.
    Retry,
    /// Check configuration, database and credentials.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match pitstop_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            pitstop_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Schedule) => serve::run_job(config, serve::Job::Survey).await,
        Some(Commands::Retry) => serve::run_job(config, serve::Job::Retry).await,
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("pitstop: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &PitstopConfig) -> Result<(), PitstopError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| PitstopError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Copy of `config` with every credential replaced by a marker.
fn redacted(config: &PitstopConfig) -> PitstopConfig {
    let mask = |v: &Option<String>| v.as_ref().map(|_| "[redacted]".to_string());
    let mut out = config.clone();
    out.gemini.api_key = mask(&config.gemini.api_key);
    out.sms.account_sid = mask(&config.sms.account_sid);
    out.sms.auth_token = mask(&config.sms.auth_token);
    out.gateway.bearer_token = mask(&config.gateway.bearer_token);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn redaction_masks_credentials() {
        let mut config = PitstopConfig::default();
        config.gemini.api_key = Some("AIza-secret".into());
        config.sms.auth_token = Some("twilio-secret".into());
        config.gateway.bearer_token = Some("dash-secret".into());

        let out = toml::to_string_pretty(&redacted(&config)).unwrap();
        assert!(!out.contains("AIza-secret"));
        assert!(!out.contains("twilio-secret"));
        assert!(!out.contains("dash-secret"));
        assert!(out.contains("[redacted]"));
        assert!(out.contains("Premium Motors"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["pitstop", "doctor", "--plain"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Doctor { plain: true })));
        let cli = Cli::try_parse_from(["pitstop", "retry"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Retry)));
    }
}
