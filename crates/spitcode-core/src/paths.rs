use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SPITCODE_DIR: &str = ".spitcode";
pub const SESSION_DIR: &str = "session";
pub const OUTPUTS_DIR: &str = "outputs";

pub const CONFIG_FILE: &str = ".spitcode/config.yaml";
pub const STATE_FILE: &str = ".spitcode/state.yaml";
pub const INDEX_FILE: &str = ".spitcode/index.json";

// ---------------------------------------------------------------------------
// Stage hand-off files
// ---------------------------------------------------------------------------

pub const INPUT_WAV: &str = "session/input.wav";
pub const TRANSCRIPT_FILE: &str = "session/transcript.txt";
pub const PROMPT_FILE: &str = "outputs/prompt.txt";
pub const MAIN_FILE: &str = "outputs/main.py";
pub const ANALYSIS_FILE: &str = "outputs/analysis.txt";
pub const REVIEW_CHUNKS_FILE: &str = "outputs/review_chunks.json";
pub const REWRITTEN_FILE: &str = "outputs/main_rewritten.py";
pub const HARDENED_FILE: &str = "outputs/main_hardened.py";
pub const README_FILE: &str = "outputs/README.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn spitcode_dir(root: &Path) -> PathBuf {
    root.join(SPITCODE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE)
}

pub fn session_dir(root: &Path) -> PathBuf {
    root.join(SESSION_DIR)
}

pub fn outputs_dir(root: &Path) -> PathBuf {
    root.join(OUTPUTS_DIR)
}

pub fn input_wav(root: &Path) -> PathBuf {
    root.join(INPUT_WAV)
}

pub fn transcript_path(root: &Path) -> PathBuf {
    root.join(TRANSCRIPT_FILE)
}

pub fn prompt_path(root: &Path) -> PathBuf {
    root.join(PROMPT_FILE)
}

pub fn main_path(root: &Path) -> PathBuf {
    root.join(MAIN_FILE)
}

pub fn analysis_path(root: &Path) -> PathBuf {
    root.join(ANALYSIS_FILE)
}

pub fn review_chunks_path(root: &Path) -> PathBuf {
    root.join(REVIEW_CHUNKS_FILE)
}

pub fn rewritten_path(root: &Path) -> PathBuf {
    root.join(REWRITTEN_FILE)
}

pub fn hardened_path(root: &Path) -> PathBuf {
    root.join(HARDENED_FILE)
}

pub fn readme_path(root: &Path) -> PathBuf {
    root.join(README_FILE)
}

/// Resolve the documentation corpus directory; relative paths hang off `root`.
pub fn docs_dir(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
