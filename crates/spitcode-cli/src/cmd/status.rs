use crate::output::{print_json, print_table};
use anyhow::Context;
use spitcode_core::state::{PipelineState, StageStatus};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = PipelineState::load(root).context("failed to load pipeline state")?;

    if json {
        return print_json(&state);
    }

    println!("Run:     {}", state.run_id);
    println!(
        "Started: {}",
        state.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    let rows = state
        .stages
        .iter()
        .map(|r| {
            vec![
                r.stage.to_string(),
                r.status.to_string(),
                r.finished_at
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                r.output.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["STAGE", "STATUS", "FINISHED", "OUTPUT"], rows);

    for record in state.stages.iter().filter(|r| r.status == StageStatus::Failed) {
        if let Some(msg) = &record.message {
            println!("\n{} failed: {msg}", record.stage);
        }
    }

    match state.next_pending() {
        Some(stage) => println!("\nNext: spitcode {stage}"),
        None => println!("\nAll stages complete."),
    }
    Ok(())
}
