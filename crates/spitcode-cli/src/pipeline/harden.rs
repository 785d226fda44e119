use super::{Pipeline, StageOutcome};
use anyhow::Context;
use local_model::{ChatMessage, ChatRequest};
use spitcode_core::syntax::{self, SyntaxCheck};
use spitcode_core::{io, paths, prompts, text};

pub(super) async fn run(p: &Pipeline) -> anyhow::Result<StageOutcome> {
    let original = io::read_input("harden", &paths::rewritten_path(&p.root))?;

    let request = ChatRequest::new(
        p.model(),
        vec![
            ChatMessage::system(prompts::HARDENING_SYSTEM),
            ChatMessage::user(prompts::hardening_prompt(&original)),
        ],
    );
    let response = p.client.chat(request).await.context("hardening request failed")?;
    let candidate = text::strip_code_fences(response.content());

    let (code, summary) = match accept(&p.config.python.interpreter, &candidate) {
        Ok(()) => (candidate, "Hardened code saved to"),
        Err(reason) => {
            tracing::warn!(%reason, "hardened code failed syntax check, falling back to original");
            (original, "Hardened code failed syntax check, kept original in")
        }
    };

    let out = paths::hardened_path(&p.root);
    io::atomic_write(&out, code.as_bytes())?;
    Ok(StageOutcome {
        summary: format!("{summary} {}", p.display_path(&out)),
        output: out,
    })
}

/// `Err(reason)` when the candidate must not replace the input.
fn accept(interpreter: &str, candidate: &str) -> Result<(), String> {
    if candidate.trim().is_empty() {
        return Err("model returned no code".to_string());
    }
    match syntax::check_python_syntax(interpreter, candidate) {
        Ok(SyntaxCheck::Valid) => Ok(()),
        Ok(SyntaxCheck::Invalid(message)) => Err(message),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidate_is_rejected() {
        assert!(accept("python3", "  \n").is_err());
    }

    #[test]
    fn missing_interpreter_is_rejected() {
        let err = accept("no-such-python-interpreter", "x = 1").unwrap_err();
        assert!(err.contains("no-such-python-interpreter"));
    }
}
