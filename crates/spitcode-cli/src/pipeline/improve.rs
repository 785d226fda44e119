use super::{Pipeline, StageOutcome};
use anyhow::Context;
use local_model::{ChatMessage, ChatRequest};
use spitcode_core::{io, paths, prompts, review, text, SpitError};

pub(super) async fn run(p: &Pipeline) -> anyhow::Result<StageOutcome> {
    let code = io::read_input("improve", &paths::main_path(&p.root))?;
    let chunks = match review::load_chunks(&paths::review_chunks_path(&p.root)) {
        Ok(chunks) => chunks,
        Err(SpitError::MissingInput { path, .. }) => {
            tracing::warn!(%path, "no parsed review, refactoring with the fixed checklist only");
            Vec::new()
        }
        Err(e) => return Err(e).context("failed to read review chunks"),
    };

    let request = ChatRequest::new(
        p.model(),
        vec![
            ChatMessage::system(prompts::REFACTOR_SYSTEM),
            ChatMessage::user(prompts::refactor_prompt(&code, &chunks)),
        ],
    );
    let response = p.client.chat(request).await.context("refactor request failed")?;

    let cleaned = text::strip_comment_lines(&text::extract_code(response.content()));

    let out = paths::rewritten_path(&p.root);
    io::atomic_write(&out, cleaned.as_bytes())?;
    Ok(StageOutcome {
        summary: format!("Refactored code saved to {}", p.display_path(&out)),
        output: out,
    })
}
