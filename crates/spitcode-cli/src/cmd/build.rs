use crate::cmd::stage::run_tracked;
use crate::output::print_json;
use crate::pipeline::{Overrides, Pipeline, StageOptions};
use anyhow::Context;
use spitcode_core::{
    stage::Stage,
    state::{PipelineState, StageStatus},
};
use std::path::Path;

pub fn run(
    root: &Path,
    overrides: &Overrides,
    use_case: Option<String>,
    from: Stage,
    json: bool,
) -> anyhow::Result<()> {
    if use_case.is_some() && from != Stage::Record {
        anyhow::bail!(
            "a use case is only read by the record stage; drop it or drop --from {from}"
        );
    }
    let pipeline = Pipeline::open(root, overrides)?;

    // A build from the first stage is a new run; a partial build continues
    // the recorded one.
    let mut state = if from == Stage::Record {
        PipelineState::new()
    } else {
        PipelineState::load(root).context("failed to load pipeline state")?
    };
    for &earlier in &Stage::all()[..from.index()] {
        if state.status(earlier) != StageStatus::Completed {
            state.mark_skipped(earlier, &format!("build started from {from}"));
        }
    }
    tracing::info!(run_id = %state.run_id, from = %from, "build started");

    let opts = StageOptions {
        text: use_case,
        ..Default::default()
    };

    let mut completed = Vec::new();
    for &stage in from.from_here() {
        if !json {
            println!("▶ {}...", stage.description());
        }
        match run_tracked(&pipeline, &mut state, stage, &opts) {
            Ok(outcome) => {
                if !json {
                    println!("{}", outcome.summary);
                }
                completed.push(serde_json::json!({
                    "stage": stage,
                    "output": outcome.output,
                    "summary": outcome.summary,
                }));
            }
            Err(e) => {
                if json {
                    print_json(&serde_json::json!({
                        "run_id": state.run_id,
                        "completed": completed,
                        "failed": stage,
                        "error": format!("{e:#}"),
                    }))?;
                } else {
                    println!("Failed: {}", stage.description());
                }
                return Err(e);
            }
        }
    }

    if json {
        print_json(&serde_json::json!({
            "run_id": state.run_id,
            "completed": completed,
        }))?;
    } else {
        println!("All steps completed. See outputs/");
    }
    Ok(())
}
