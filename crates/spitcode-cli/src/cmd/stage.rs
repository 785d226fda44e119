use crate::cmd::block_on;
use crate::output::print_json;
use crate::pipeline::{Overrides, Pipeline, StageOptions, StageOutcome};
use anyhow::Context;
use spitcode_core::{stage::Stage, state::PipelineState};
use std::path::Path;

pub fn run(
    root: &Path,
    overrides: &Overrides,
    stage: Stage,
    opts: StageOptions,
    json: bool,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root, overrides)?;
    let mut state = PipelineState::load(root).context("failed to load pipeline state")?;

    let outcome = run_tracked(&pipeline, &mut state, stage, &opts)?;

    if json {
        print_json(&serde_json::json!({
            "stage": stage,
            "output": outcome.output,
            "summary": outcome.summary,
        }))?;
    } else {
        println!("{}", outcome.summary);
    }
    Ok(())
}

/// Run `stage`, recording running/completed/failed in the state file.
pub fn run_tracked(
    pipeline: &Pipeline,
    state: &mut PipelineState,
    stage: Stage,
    opts: &StageOptions,
) -> anyhow::Result<StageOutcome> {
    state.mark_running(stage);
    state
        .save(&pipeline.root)
        .context("failed to save pipeline state")?;

    let result = block_on(pipeline.run_stage(stage, opts))?;

    match &result {
        Ok(outcome) => state.mark_completed(
            stage,
            &outcome.output,
            Some(outcome.summary.clone()),
        ),
        Err(e) => state.mark_failed(stage, &format!("{e:#}")),
    }
    state
        .save(&pipeline.root)
        .context("failed to save pipeline state")?;

    result.with_context(|| format!("{stage} failed"))
}
