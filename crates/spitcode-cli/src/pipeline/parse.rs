use super::{Pipeline, StageOutcome};
use spitcode_core::{io, paths, review};

pub(super) fn run(p: &Pipeline) -> anyhow::Result<StageOutcome> {
    let raw = io::read_input("parse", &paths::analysis_path(&p.root))?;
    let chunks = review::parse_review(&raw);
    if chunks.is_empty() {
        tracing::warn!("no review sections recognised in the analysis");
    }

    let out = paths::review_chunks_path(&p.root);
    review::save_chunks(&out, &chunks)?;
    Ok(StageOutcome {
        summary: format!(
            "Saved {} review chunks to {}",
            chunks.len(),
            p.display_path(&out)
        ),
        output: out,
    })
}
