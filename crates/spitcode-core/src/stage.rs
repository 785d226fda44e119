use crate::error::SpitError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One step of the pipeline. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Record,
    Generate,
    Analyze,
    Parse,
    Improve,
    Harden,
    Readme,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Record,
            Stage::Generate,
            Stage::Analyze,
            Stage::Parse,
            Stage::Improve,
            Stage::Harden,
            Stage::Readme,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::all().get(self.index() + 1).copied()
    }

    /// This stage and every stage after it.
    pub fn from_here(self) -> &'static [Stage] {
        &Stage::all()[self.index()..]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Record => "record",
            Stage::Generate => "generate",
            Stage::Analyze => "analyze",
            Stage::Parse => "parse",
            Stage::Improve => "improve",
            Stage::Harden => "harden",
            Stage::Readme => "readme",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Record => "Recording use case",
            Stage::Generate => "Generating initial code",
            Stage::Analyze => "Analyzing code",
            Stage::Parse => "Parsing code analysis to JSON",
            Stage::Improve => "Refactoring based on suggestions",
            Stage::Harden => "Hardening for production",
            Stage::Readme => "Generating README",
        }
    }

    /// The hand-off file this stage writes.
    pub fn output(self, root: &Path) -> PathBuf {
        match self {
            Stage::Record => paths::transcript_path(root),
            Stage::Generate => paths::main_path(root),
            Stage::Analyze => paths::analysis_path(root),
            Stage::Parse => paths::review_chunks_path(root),
            Stage::Improve => paths::rewritten_path(root),
            Stage::Harden => paths::hardened_path(root),
            Stage::Readme => paths::readme_path(root),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = SpitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(Stage::Record),
            "generate" => Ok(Stage::Generate),
            "analyze" => Ok(Stage::Analyze),
            "parse" => Ok(Stage::Parse),
            "improve" => Ok(Stage::Improve),
            "harden" => Ok(Stage::Harden),
            "readme" => Ok(Stage::Readme),
            other => Err(SpitError::InvalidStage(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
