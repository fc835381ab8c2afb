//! `helmsman turn` — Process a single input with the default handlers.

use helmsman_config::HelmsmanConfig;
use helmsman_core::session::SessionContext;
use helmsman_pipeline::Orchestrator;
use uuid::Uuid;

pub async fn run(
    input: &str,
    session: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = HelmsmanConfig::load(&HelmsmanConfig::default_path())?;
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let orchestrator = Orchestrator::new(&config);
    let ctx = orchestrator.process(input, &session_id, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ctx)?);
    } else {
        print_summary(&ctx);
    }
    Ok(())
}

pub(crate) fn print_summary(ctx: &SessionContext) {
    println!("Session: {}", ctx.session_id);

    if let Some(intent) = &ctx.current_intent {
        println!(
            "  Intent:    {} (overall confidence {:.2})",
            intent.kind,
            intent.confidence.overall()
        );
    }

    if let Some(finding) = &ctx.anti_pattern {
        println!(
            "  Warning:   {} detected (severity {:.2})",
            finding.pattern, finding.severity
        );
        println!("  Pivot:     {}", finding.suggested_pivot);
        return;
    }

    if let Some(strategy) = &ctx.selected_strategy {
        println!("  Strategy:  {} — {}", strategy.kind, strategy.reasoning);
    }

    if let Some(result) = &ctx.execution_result {
        let status = if result.success { "ok" } else { "failed" };
        println!(
            "  Execution: {status} in {}ms — {}",
            result.metrics.duration_ms,
            if result.success {
                result.output.as_str()
            } else {
                result.error.as_deref().unwrap_or("unknown error")
            }
        );
    }
}
