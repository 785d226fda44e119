use super::index::{self, IndexBuild};
use super::{Pipeline, StageOptions, StageOutcome};
use anyhow::Context;
use local_model::GenerateRequest;
use spitcode_core::{io, paths, prompts, rag, text};

pub(super) async fn run(p: &Pipeline, opts: &StageOptions) -> anyhow::Result<StageOutcome> {
    let code = io::read_input("analyze", &paths::main_path(&p.root))?;

    let context = retrieve_context(p, &code, opts.force_index).await?;
    if context.is_empty() {
        tracing::warn!("no documentation context: reviewing without it");
    }

    let request = GenerateRequest::new(p.model(), prompts::review_prompt(&context, &code))
        .with_system(prompts::REVIEWER_SYSTEM);
    let response = p
        .client
        .generate(request)
        .await
        .context("review request failed")?;
    let analysis = text::strip_think_blocks(&response.response).trim().to_string();

    let out = paths::analysis_path(&p.root);
    io::atomic_write(&out, analysis.as_bytes())?;
    Ok(StageOutcome {
        summary: format!("Analysis written to {}", p.display_path(&out)),
        output: out,
    })
}

/// Top-k documentation passages for `code`, joined for the review prompt.
async fn retrieve_context(p: &Pipeline, code: &str, force: bool) -> anyhow::Result<String> {
    let rag_cfg = &p.config.rag;
    let IndexBuild { index, .. } = index::build(p, force).await?;
    if index.is_empty() || rag_cfg.top_k == 0 {
        return Ok(String::new());
    }

    let query = format!(
        "{}{}",
        rag_cfg.query_prefix,
        text::truncate_chars(code, rag_cfg.max_query_chars)
    );
    let embeddings = p
        .client
        .embed(&index.model, &[query])
        .await
        .context("query embedding failed")?;
    let Some(query_vec) = embeddings.first() else {
        return Ok(String::new());
    };

    let hits = index.retrieve(query_vec, rag_cfg.top_k);
    for hit in &hits {
        tracing::debug!(source = %hit.entry.source, score = hit.score, "retrieved");
    }
    Ok(rag::join_context(&hits))
}
