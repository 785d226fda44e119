use crate::error::{Result, SpitError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `data` to `path` through a sibling tempfile, creating parent
/// directories. A stage that fails halfway never leaves a truncated
/// hand-off file behind.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Read the hand-off file a stage depends on.
///
/// A missing file is reported as [`SpitError::MissingInput`] naming the
/// stage, so the CLI can tell the user which earlier step to run.
pub fn read_input(stage: &str, path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SpitError::MissingInput {
            stage: stage.to_string(),
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// [`read_input`], trimmed; whitespace-only content is [`SpitError::EmptyInput`].
pub fn read_nonempty_input(stage: &str, path: &Path) -> Result<String> {
    let text = read_input(stage, path)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SpitError::EmptyInput(path.display().to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        atomic_write(&path, b"print('hi')").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('hi')");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outputs/nested/main.py");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn read_input_missing_names_stage() {
        let dir = TempDir::new().unwrap();
        let err = read_input("analyze", &dir.path().join("outputs/main.py")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("No main.py found at "), "{msg}");
        assert!(msg.ends_with("(needed by analyze)"), "{msg}");
    }

    #[test]
    fn read_nonempty_input_trims_and_rejects_blank() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session/transcript.txt");
        atomic_write(&path, b"  a todo app \n").unwrap();
        assert_eq!(read_nonempty_input("generate", &path).unwrap(), "a todo app");

        atomic_write(&path, b" \n\t").unwrap();
        let err = read_nonempty_input("generate", &path).unwrap_err();
        assert!(matches!(err, SpitError::EmptyInput(_)));
    }
}
