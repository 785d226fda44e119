use super::{Pipeline, StageOutcome};
use anyhow::Context;
use local_model::{collect_generation, GenerateRequest};
use spitcode_core::{io, paths, prompts, text};

pub(super) async fn run(p: &Pipeline) -> anyhow::Result<StageOutcome> {
    let transcript_path = paths::transcript_path(&p.root);
    let story = io::read_nonempty_input("generate", &transcript_path)?;

    let prompt = prompts::generation_prompt(&story);
    io::atomic_write(&paths::prompt_path(&p.root), prompt.as_bytes())?;

    let request = GenerateRequest::new(p.model(), prompt).with_system(prompts::GENERATOR_SYSTEM);
    let stream = p
        .client
        .generate_stream(request)
        .await
        .context("generation request failed")?;
    let raw = collect_generation(stream)
        .await
        .context("generation stream failed")?;

    let code = text::clean_generation(&raw);
    if code.is_empty() {
        tracing::warn!("model returned no code");
    }

    let out = paths::main_path(&p.root);
    io::atomic_write(&out, code.as_bytes())?;
    Ok(StageOutcome {
        summary: format!("Code written to {}", p.display_path(&out)),
        output: out,
    })
}
