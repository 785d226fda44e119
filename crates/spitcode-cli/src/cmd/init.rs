use anyhow::Context;
use spitcode_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing spitcode in: {}", root.display());

    let config = Config::load(root).context("failed to load config")?;
    let docs_dir = paths::docs_dir(root, &config.rag.docs_dir);
    let dirs = [
        root.join(paths::SPITCODE_DIR),
        paths::session_dir(root),
        paths::outputs_dir(root),
        docs_dir.clone(),
    ];
    for dir in &dirs {
        io::ensure_dir(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        config.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    if std::fs::read_dir(&docs_dir)?.next().is_none() {
        println!(
            "  empty:   {} (add FastAPI and security guides for the review)",
            config.rag.docs_dir.display()
        );
    }

    println!("\nNext: spitcode build \"<describe your app>\"");
    Ok(())
}
