//! End-to-end flows the CLI builds on: a REPL-style learning session with
//! snapshot persistence to disk, and the JSON shape `turn --json` prints.

use std::io::Write;
use std::sync::Arc;

use helmsman_config::HelmsmanConfig;
use helmsman_core::event::PipelineStage;
use helmsman_core::feedback::{ImplicitSignals, TurnFeedback};
use helmsman_pipeline::{LearningBridge, Orchestrator, PolicySelector};
use helmsman_policy::PreferenceModel;

#[tokio::test]
async fn repl_session_trains_model_and_survives_snapshot_on_disk() {
    let config = HelmsmanConfig::default();
    let model = Arc::new(PreferenceModel::new(config.policy.clone()));
    let orch =
        Orchestrator::new(&config).with_selector(Arc::new(PolicySelector::new(model.clone())));
    orch.on(
        PipelineStage::FeedbackCollection,
        Arc::new(LearningBridge::new(model.clone())),
    );

    let inputs = [
        "How does the billing module work?",
        "Create a cleanup job for stale sessions",
        "Explain the retry policy",
    ];
    for input in inputs {
        orch.process(input, "repl-sess", None).await.unwrap();
        orch.submit_feedback(
            "repl-sess",
            TurnFeedback {
                rating: Some(4),
                implicit: Some(ImplicitSignals {
                    task_completed: true,
                    seconds_to_completion: 45.0,
                    edits_made: 1,
                }),
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(model.iterations(), 3);
    assert_eq!(model.reward_history_len(), 3);

    // save on exit, load on next start
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(model.export_model().unwrap().as_bytes()).unwrap();

    let restored = PreferenceModel::new(config.policy.clone());
    let blob = std::fs::read_to_string(file.path()).unwrap();
    restored.import_model(&blob).unwrap();

    assert_eq!(restored.iterations(), 3);
    assert_eq!(restored.reward_history_len(), 3);
    let stats = restored.strategy_stats();
    let total: usize = stats.values().map(|s| s.count).sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn json_output_carries_the_full_turn_decision() {
    let orch = Orchestrator::new(&HelmsmanConfig::default());
    let ctx = orch
        .process("Create a new service", "json-sess", None)
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&ctx).unwrap()).unwrap();
    assert_eq!(json["session_id"], "json-sess");
    assert_eq!(json["current_intent"]["kind"], "actionable_task");
    assert_eq!(json["selected_strategy"]["kind"], "confirm_first");
    assert_eq!(json["execution_result"]["success"], true);
    assert_eq!(json["history"].as_array().unwrap().len(), 5);
}
