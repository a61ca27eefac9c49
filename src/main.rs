use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volley_tracker::{
    CommandOutcome, FileMatchRepository, MatchCommand, MatchService, MatchStatus, TrackerConfig,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusLine {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(flatten)]
    status: MatchStatus,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volley_tracker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TrackerConfig::from_env();
    info!(
        sport = ?config.sport,
        data_file = %config.data_file.display(),
        "Starting volleyball match tracker"
    );

    let repository = Arc::new(FileMatchRepository::new(config.data_file.clone()));
    let service = MatchService::builder(repository)
        .with_config(config)
        .build();

    // Resume a stored match when an id is given, otherwise start a new one
    let match_id = match std::env::args().nth(1) {
        Some(id) => service.open_match(&id).await?.id,
        None => service.create_match().await?.id,
    };
    info!(match_id = %match_id, "Reading commands from stdin, one JSON object per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command: MatchCommand = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Unreadable command");
                println!("{}", serde_json::json!({ "outcome": "invalid", "reason": e.to_string() }));
                continue;
            }
        };

        let outcome = service.apply(&match_id, command).await?;
        let (outcome, reason) = match outcome {
            CommandOutcome::Applied => ("applied", None),
            CommandOutcome::Ignored(reason) => ("ignored", Some(reason.to_string())),
        };
        let line = StatusLine {
            outcome,
            reason,
            status: service.status(&match_id).await?,
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    service.flush().await;
    let summary = service.close_match(&match_id).await?;
    info!(
        match_id = %summary.id,
        sets = summary.completed_sets.len(),
        finished = summary.finished,
        "Match saved"
    );
    Ok(())
}
