//! Microphone capture through an external recorder binary.
//!
//! The recorder is detected on `PATH` in priority order, the same way a
//! runtime is picked for tool scripts. Every recorder writes a mono 16-bit
//! PCM WAV file that the transcription server accepts as-is.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, SpitError};

/// Supported recorders, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorder {
    /// ALSA `arecord` (Linux).
    Arecord,
    /// SoX `rec`.
    Sox,
    Ffmpeg,
}

impl Recorder {
    pub fn all() -> &'static [Recorder] {
        &[Recorder::Arecord, Recorder::Sox, Recorder::Ffmpeg]
    }

    pub fn binary(self) -> &'static str {
        match self {
            Recorder::Arecord => "arecord",
            Recorder::Sox => "rec",
            Recorder::Ffmpeg => "ffmpeg",
        }
    }

    /// Map a configured recorder name (or path) to a recorder.
    pub fn from_name(name: &str) -> Option<Recorder> {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match stem.as_str() {
            "arecord" => Some(Recorder::Arecord),
            "rec" | "sox" => Some(Recorder::Sox),
            "ffmpeg" => Some(Recorder::Ffmpeg),
            _ => None,
        }
    }
}

/// Pick the recorder to use: the configured one if set, otherwise the first
/// supported binary found on `PATH`.
pub fn detect_recorder(configured: Option<&str>) -> Result<Recorder> {
    if let Some(name) = configured {
        let recorder = Recorder::from_name(name)
            .ok_or_else(|| SpitError::RecorderFailed(format!("unsupported recorder '{name}'")))?;
        if which::which(recorder.binary()).is_err() {
            return Err(SpitError::NoRecorder);
        }
        return Ok(recorder);
    }
    Recorder::all()
        .iter()
        .copied()
        .find(|r| which::which(r.binary()).is_ok())
        .ok_or(SpitError::NoRecorder)
}

/// Recording length must be positive: every supported recorder reads a zero
/// duration as "until interrupted".
pub fn check_duration(seconds: u32) -> Result<()> {
    if seconds == 0 {
        return Err(SpitError::RecorderFailed(
            "recording length must be at least 1 second".to_string(),
        ));
    }
    Ok(())
}

/// Record `seconds` of mono audio at `sample_rate` into `path`.
pub fn record_wav(recorder: Recorder, path: &Path, seconds: u32, sample_rate: u32) -> Result<()> {
    check_duration(seconds)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(recorder = recorder.binary(), seconds, sample_rate, path = %path.display(), "recording");

    let output = build_command(recorder, path, seconds, sample_rate)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| SpitError::RecorderFailed(format!("{}: {e}", recorder.binary())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let hint = stderr.trim().chars().take(500).collect::<String>();
        return Err(SpitError::RecorderFailed(hint));
    }
    if !path.exists() {
        return Err(SpitError::RecorderFailed(format!(
            "{} exited without writing {}",
            recorder.binary(),
            path.display()
        )));
    }
    Ok(())
}

fn build_command(recorder: Recorder, path: &Path, seconds: u32, sample_rate: u32) -> Command {
    let seconds = seconds.to_string();
    let rate = sample_rate.to_string();
    let mut cmd = Command::new(recorder.binary());
    match recorder {
        Recorder::Arecord => {
            cmd.args(["-q", "-f", "S16_LE", "-c", "1", "-r", &rate, "-d", &seconds]);
            cmd.arg(path);
        }
        Recorder::Sox => {
            cmd.args(["-q", "-c", "1", "-b", "16", "-r", &rate]);
            cmd.arg(path);
            cmd.args(["trim", "0", &seconds]);
        }
        Recorder::Ffmpeg => {
            cmd.args(["-y", "-loglevel", "error"]);
            cmd.args(ffmpeg_input());
            cmd.args(["-t", &seconds, "-ac", "1", "-ar", &rate, "-acodec", "pcm_s16le"]);
            cmd.arg(path);
        }
    }
    cmd
}

fn ffmpeg_input() -> [&'static str; 4] {
    if cfg!(target_os = "macos") {
        ["-f", "avfoundation", "-i", ":0"]
    } else if cfg!(target_os = "windows") {
        ["-f", "dshow", "-i", "audio=default"]
    } else {
        ["-f", "alsa", "-i", "default"]
    }
}
