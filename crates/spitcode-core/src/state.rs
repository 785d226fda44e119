use crate::error::Result;
use crate::paths;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StageRecord {
    fn pending(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            started_at: None,
            finished_at: None,
            output: None,
            message: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Progress of the most recent pipeline run, kept in `.spitcode/state.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageRecord>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// A fresh run with every stage pending.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: 1,
            run_id: Uuid::new_v4(),
            started_at: now,
            stages: Stage::all().iter().map(|&s| StageRecord::pending(s)).collect(),
            last_updated: now,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Load the saved state, or a fresh one when none exists yet.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = std::fs::read_to_string(&path)?;
        let mut state: PipelineState = serde_yaml::from_str(&data)?;
        state.fill_missing();
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Keep one record per stage, in stage order, whatever the file held.
    fn fill_missing(&mut self) {
        let mut records = Vec::with_capacity(Stage::all().len());
        for &stage in Stage::all() {
            let record = self
                .stages
                .iter()
                .find(|r| r.stage == stage)
                .cloned()
                .unwrap_or_else(|| StageRecord::pending(stage));
            records.push(record);
        }
        self.stages = records;
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.record(stage)
            .map(|r| r.status)
            .unwrap_or(StageStatus::Pending)
    }

    /// The first stage that has not completed (skipped counts as done).
    pub fn next_pending(&self) -> Option<Stage> {
        Stage::all().iter().copied().find(|&s| {
            !matches!(
                self.status(s),
                StageStatus::Completed | StageStatus::Skipped
            )
        })
    }

    pub fn is_complete(&self) -> bool {
        self.next_pending().is_none()
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    fn record_mut(&mut self, stage: Stage) -> &mut StageRecord {
        if let Some(i) = self.stages.iter().position(|r| r.stage == stage) {
            return &mut self.stages[i];
        }
        self.stages.push(StageRecord::pending(stage));
        self.stages.sort_by_key(|r| r.stage);
        let i = self
            .stages
            .iter()
            .position(|r| r.stage == stage)
            .unwrap_or(self.stages.len() - 1);
        &mut self.stages[i]
    }

    pub fn mark_running(&mut self, stage: Stage) {
        let now = Utc::now();
        let record = self.record_mut(stage);
        record.status = StageStatus::Running;
        record.started_at = Some(now);
        record.finished_at = None;
        record.message = None;
        self.last_updated = now;
    }

    pub fn mark_completed(&mut self, stage: Stage, output: &Path, message: Option<String>) {
        let now = Utc::now();
        let record = self.record_mut(stage);
        record.status = StageStatus::Completed;
        record.finished_at = Some(now);
        record.output = Some(output.display().to_string());
        record.message = message;
        self.last_updated = now;
    }

    pub fn mark_failed(&mut self, stage: Stage, error: &str) {
        let now = Utc::now();
        let record = self.record_mut(stage);
        record.status = StageStatus::Failed;
        record.finished_at = Some(now);
        record.message = Some(error.to_string());
        self.last_updated = now;
    }

    pub fn mark_skipped(&mut self, stage: Stage, reason: &str) {
        let now = Utc::now();
        let record = self.record_mut(stage);
        record.status = StageStatus::Skipped;
        record.message = Some(reason.to_string());
        self.last_updated = now;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
