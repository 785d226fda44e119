use super::{Pipeline, StageOptions, StageOutcome};
use anyhow::Context;
use local_model::WhisperClient;
use spitcode_core::{io, paths, recorder, SpitError};

pub(super) async fn run(p: &Pipeline, opts: &StageOptions) -> anyhow::Result<StageOutcome> {
    let transcript_path = paths::transcript_path(&p.root);

    let transcript = match &opts.text {
        Some(text) => text.trim().to_string(),
        None => capture(p, opts.seconds).await?,
    };
    if transcript.is_empty() {
        return Err(SpitError::EmptyInput("transcript".to_string()).into());
    }

    io::atomic_write(&transcript_path, transcript.as_bytes())
        .with_context(|| format!("failed to write {}", transcript_path.display()))?;

    Ok(StageOutcome {
        output: transcript_path,
        summary: format!("You said: {transcript}"),
    })
}

/// Record from the microphone, then send the WAV to the speech server.
async fn capture(p: &Pipeline, seconds: Option<u32>) -> anyhow::Result<String> {
    let speech = &p.config.speech;
    let seconds = seconds.unwrap_or(speech.record_seconds);
    recorder::check_duration(seconds)?;
    let wav = paths::input_wav(&p.root);
    io::ensure_dir(&paths::session_dir(&p.root))?;

    let device = recorder::detect_recorder(speech.recorder.as_deref())?;
    println!("Recording for {seconds} seconds...");
    let (target, rate) = (wav.clone(), speech.sample_rate);
    tokio::task::spawn_blocking(move || recorder::record_wav(device, &target, seconds, rate))
        .await
        .context("recorder task panicked")??;
    println!("Recording complete.");

    let mut whisper = WhisperClient::new(&speech.transcription_url, p.timeout())
        .context("failed to build transcription client")?;
    if let Some(model) = &speech.transcription_model {
        whisper = whisper.with_model(model);
    }
    let text = whisper
        .transcribe(&wav, speech.language.as_deref())
        .await
        .with_context(|| format!("transcription via {} failed", speech.transcription_url))?;
    Ok(text.trim().to_string())
}
