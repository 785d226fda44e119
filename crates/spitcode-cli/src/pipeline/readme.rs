use super::{Pipeline, StageOutcome};
use anyhow::Context;
use local_model::GenerateRequest;
use spitcode_core::{io, paths, prompts, text};

pub(super) async fn run(p: &Pipeline) -> anyhow::Result<StageOutcome> {
    let code = io::read_input("readme", &paths::hardened_path(&p.root))?;

    let request = GenerateRequest::new(p.model(), prompts::readme_prompt(&code));
    let response = p
        .client
        .generate(request)
        .await
        .context("README request failed")?;
    let readme = text::strip_think_blocks(&response.response).trim().to_string();

    let out = paths::readme_path(&p.root);
    io::atomic_write(&out, readme.as_bytes())?;
    Ok(StageOutcome {
        summary: format!("README.md generated at {}", p.display_path(&out)),
        output: out,
    })
}
