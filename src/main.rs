//! faceunlock-check - one-shot face authentication test
//!
//! Runs one attempt against the face unlock daemon and prints the result.

use anyhow::{Context, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pam_faceunlock::cli::Cli;
use pam_faceunlock::client::{ClientSettings, FaceAuthClient, PamOutcome, Verdict};
use pam_faceunlock::config::Config;
use pam_faceunlock::identity::StaticIdentity;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    if cli.verbose {
        init_tracing();
    }

    let mut config = Config::load(&cli.config)?;
    if let Some(socket) = &cli.socket {
        config.socket_path = socket.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate()?;

    let user = cli
        .user
        .clone()
        .context("no username given and $USER is not set")?;
    tracing::debug!("Checking face authentication for {}", user);

    let client = FaceAuthClient::new(ClientSettings::from(&config));
    let result = client.attempt(&StaticIdentity::new(user.as_str()));

    let outcome = match &result {
        Ok(response) => PamOutcome::from(Verdict::from_response(response)),
        Err(_) => PamOutcome::NotHandled,
    };

    if cli.json {
        let report = match &result {
            Ok(response) => serde_json::json!({
                "user": user,
                "response": response,
                "outcome": outcome_name(outcome),
            }),
            Err(err) => serde_json::json!({
                "user": user,
                "error": err.to_string(),
                "stage": err.stage(),
                "outcome": outcome_name(outcome),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== Face Authentication Test ===");
        println!("User: {}", user);
        println!("Socket: {}", config.socket_path.display());
        match &result {
            Ok(response) => {
                println!("Success: {}", response.ok);
                if let Some(confidence) = response.confidence {
                    println!("Confidence: {:.3}", confidence);
                }
                if let Some(reason) = response.explanation() {
                    println!("Reason: {}", reason);
                }
            }
            Err(err) => {
                println!("Success: false");
                println!("Error ({}): {}", err.stage(), err);
            }
        }
        println!("PAM result: {}", outcome_name(outcome));
    }

    std::process::exit(match outcome {
        PamOutcome::Success => 0,
        PamOutcome::NotHandled => 1,
    });
}

fn outcome_name(outcome: PamOutcome) -> &'static str {
    match outcome {
        PamOutcome::Success => "PAM_SUCCESS",
        PamOutcome::NotHandled => "PAM_IGNORE",
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pam_faceunlock=debug,faceunlock_check=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
