use spitcode_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `SPITCODE_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of the cwd containing `.spitcode/`
/// 3. Nearest ancestor of the cwd containing `.git/`
/// 4. The cwd itself
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marker(&cwd, paths::SPITCODE_DIR)
        .or_else(|| find_marker(&cwd, ".git"))
        .unwrap_or(cwd)
}

/// First of `start` and its ancestors that holds a `marker` directory.
fn find_marker(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn marker_found_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".spitcode")).unwrap();
        let deep = dir.path().join("outputs/nested");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_marker(&deep, ".spitcode").as_deref(), Some(dir.path()));
    }

    #[test]
    fn spitcode_marker_is_preferred_over_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("app");
        std::fs::create_dir_all(project.join(".spitcode")).unwrap();

        assert_eq!(find_marker(&project, ".spitcode").as_deref(), Some(project.as_path()));
        assert_eq!(find_marker(&project, ".git").as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_marker_gives_none() {
        let dir = TempDir::new().unwrap();
        assert!(find_marker(dir.path(), "definitely-not-a-marker").is_none());
    }
}
