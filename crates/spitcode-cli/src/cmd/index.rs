use crate::cmd::block_on;
use crate::output::print_json;
use crate::pipeline::{index, Overrides, Pipeline};
use spitcode_core::paths;
use std::path::Path;

pub fn run(root: &Path, overrides: &Overrides, force: bool, json: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root, overrides)?;
    let built = block_on(index::build(&pipeline, force))??;

    let docs_dir = paths::docs_dir(root, &pipeline.config.rag.docs_dir);
    if json {
        print_json(&serde_json::json!({
            "docs_dir": docs_dir,
            "documents": built.documents,
            "chunks": built.index.len(),
            "model": built.index.model,
            "cached": built.cached,
        }))?;
        return Ok(());
    }

    if built.documents == 0 {
        println!(
            "No documents in {}; reviews will run without documentation context.",
            docs_dir.display()
        );
    } else if built.cached {
        println!(
            "Index is current: {} chunks from {} documents.",
            built.index.len(),
            built.documents
        );
    } else {
        println!(
            "Indexed {} chunks from {} documents with {}.",
            built.index.len(),
            built.documents,
            built.index.model
        );
    }
    Ok(())
}
