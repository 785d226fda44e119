use super::Pipeline;
use anyhow::Context;
use spitcode_core::{paths, rag};
use spitcode_core::rag::VectorIndex;

pub struct IndexBuild {
    pub index: VectorIndex,
    pub documents: usize,
    /// True when the saved index was current and nothing was embedded.
    pub cached: bool,
}

/// Load the saved index when it still matches the corpus, otherwise embed the
/// corpus and save a new one.
pub async fn build(p: &Pipeline, force: bool) -> anyhow::Result<IndexBuild> {
    let rag_cfg = &p.config.rag;
    let embed_model = &p.config.model.embedding_model;
    let docs_dir = paths::docs_dir(&p.root, &rag_cfg.docs_dir);
    let index_path = paths::index_path(&p.root);

    let docs = rag::load_documents(&docs_dir)
        .with_context(|| format!("failed to read {}", docs_dir.display()))?;
    let chunks = rag::chunk_documents(&docs, rag_cfg.chunk_chars);
    let fingerprint = rag::fingerprint(embed_model, rag_cfg.chunk_chars, &chunks);

    if !force {
        match VectorIndex::load(&index_path) {
            Ok(Some(index)) if index.fingerprint == fingerprint => {
                tracing::debug!(entries = index.len(), "using cached index");
                return Ok(IndexBuild {
                    index,
                    documents: docs.len(),
                    cached: true,
                });
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable index cache"),
        }
    }

    let mut embeddings = Vec::with_capacity(chunks.len());
    let inputs: Vec<String> = chunks
        .iter()
        .map(|c| format!("{}{}", rag_cfg.document_prefix, c.text))
        .collect();
    for batch in inputs.chunks(rag_cfg.embed_batch_size.max(1)) {
        let vectors = p
            .client
            .embed(embed_model, batch)
            .await
            .context("document embedding failed")?;
        embeddings.extend(vectors);
    }
    tracing::info!(documents = docs.len(), chunks = chunks.len(), "corpus embedded");

    let index = VectorIndex::new(embed_model.as_str(), fingerprint, chunks, embeddings);
    index
        .save(&index_path)
        .with_context(|| format!("failed to write {}", index_path.display()))?;
    Ok(IndexBuild {
        index,
        documents: docs.len(),
        cached: false,
    })
}
