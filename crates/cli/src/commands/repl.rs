//! `helmsman repl` — Interactive session with online strategy learning.
//!
//! Wires the bandit-backed selector and the learning bridge into the
//! pipeline, so `/feedback N` after a turn actually trains the model.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use helmsman_config::HelmsmanConfig;
use helmsman_core::event::PipelineStage;
use helmsman_core::feedback::TurnFeedback;
use helmsman_pipeline::{LearningBridge, Orchestrator, PolicySelector};
use helmsman_policy::PreferenceModel;
use uuid::Uuid;

pub async fn run(
    session: Option<String>,
    model_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = HelmsmanConfig::load(&HelmsmanConfig::default_path())?;
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let model = Arc::new(PreferenceModel::new(config.policy.clone()));
    if let Some(path) = &model_path {
        if path.exists() {
            let blob = std::fs::read_to_string(path)?;
            model.import_model(&blob)?;
            println!("Loaded model snapshot from {}", path.display());
        }
    }

    let orchestrator =
        Orchestrator::new(&config).with_selector(Arc::new(PolicySelector::new(model.clone())));
    orchestrator.on(
        PipelineStage::FeedbackCollection,
        Arc::new(LearningBridge::new(model.clone())),
    );

    println!("Helmsman REPL — session {session_id}");
    println!("Type your input; '/feedback N' rates the last turn (0-5); '/quit' exits.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        if let Some(rating) = line.strip_prefix("/feedback") {
            match rating.trim().parse::<u8>() {
                Ok(rating) if rating <= 5 => {
                    orchestrator
                        .submit_feedback(&session_id, TurnFeedback::rating(rating))
                        .await?;
                    println!("Recorded rating {rating}.");
                }
                _ => println!("Usage: /feedback N  (N between 0 and 5)"),
            }
            continue;
        }

        match orchestrator.process(line, &session_id, None).await {
            Ok(ctx) => super::turn::print_summary(&ctx),
            Err(e) => eprintln!("Turn failed: {e}"),
        }
        println!();
    }

    if let Some(path) = &model_path {
        std::fs::write(path, model.export_model()?)?;
        println!("Saved model snapshot to {}", path.display());
    }
    Ok(())
}
