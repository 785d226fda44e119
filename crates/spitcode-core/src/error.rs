use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpitError {
    #[error("No {file} found at {path} (needed by {stage})")]
    MissingInput {
        stage: String,
        file: String,
        path: String,
    },

    #[error("input is empty: {0}")]
    EmptyInput(String),

    #[error("invalid stage '{0}': expected one of record, generate, analyze, parse, improve, harden, readme")]
    InvalidStage(String),

    #[error("no audio recorder found: install arecord, sox (rec) or ffmpeg, or set speech.recorder")]
    NoRecorder,

    #[error("recording failed: {0}")]
    RecorderFailed(String),

    #[error("python interpreter not found: {0}")]
    InterpreterNotFound(String),

    #[error("syntax check failed to run: {0}")]
    SyntaxCheckFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpitError>;
