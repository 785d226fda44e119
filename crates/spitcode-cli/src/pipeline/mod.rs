//! Stage operations. Each stage reads the previous stage's hand-off file,
//! makes at most a few model calls and writes its own hand-off file.

mod analyze;
mod generate;
mod harden;
mod improve;
pub mod index;
mod parse;
mod readme;
mod record;

use anyhow::Context;
use local_model::OllamaClient;
use spitcode_core::{config::Config, stage::Stage};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Command-line overrides for the model section of the config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub model: Option<String>,
}

/// Per-invocation knobs for the stages that take any.
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Record stage: use this text instead of the microphone.
    pub text: Option<String>,
    /// Record stage: recording length.
    pub seconds: Option<u32>,
    /// Analyze stage: rebuild the retrieval index.
    pub force_index: bool,
}

/// What a finished stage produced.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub output: PathBuf,
    /// One line for the user, e.g. "Saved 4 review chunks".
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything a stage needs: the project root, the effective config and a
/// model server client built from it.
pub struct Pipeline {
    pub root: PathBuf,
    pub config: Config,
    pub client: OllamaClient,
}

/// Config file, then environment, then command-line flags.
pub fn effective_config(root: &Path, overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load(root).context("failed to load config")?;
    config.apply_env();
    config.apply_overrides(overrides.server_url.as_deref(), overrides.model.as_deref());
    Ok(config)
}

impl Pipeline {
    pub fn open(root: &Path, overrides: &Overrides) -> anyhow::Result<Self> {
        let config = effective_config(root, overrides)?;
        let client = OllamaClient::new(&config.model.base_url, config.model.timeout())
            .context("failed to build model server client")?;
        tracing::debug!(
            base_url = %config.model.base_url,
            model = %config.model.name,
            "pipeline opened"
        );
        Ok(Self {
            root: root.to_path_buf(),
            config,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.model.timeout()
    }

    /// Run one stage to completion.
    pub async fn run_stage(&self, stage: Stage, opts: &StageOptions) -> anyhow::Result<StageOutcome> {
        tracing::info!(stage = %stage, "stage started");
        let outcome = match stage {
            Stage::Record => record::run(self, opts).await,
            Stage::Generate => generate::run(self).await,
            Stage::Analyze => analyze::run(self, opts).await,
            Stage::Parse => parse::run(self),
            Stage::Improve => improve::run(self).await,
            Stage::Harden => harden::run(self).await,
            Stage::Readme => readme::run(self).await,
        }?;
        tracing::info!(stage = %stage, output = %outcome.output.display(), "stage finished");
        Ok(outcome)
    }

    /// `path` relative to the project root, for messages.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
