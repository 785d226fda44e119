//! Retrieval over a local documentation corpus.
//!
//! Documents are read from a directory, split into paragraph-packed chunks,
//! embedded by the model server and kept in a flat [`VectorIndex`]. Retrieval
//! is brute-force cosine similarity; the corpus is a handful of guides, not a
//! search engine.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus directory, `/`-separated.
    pub source: String,
    pub text: String,
}

/// Read every non-hidden UTF-8 file under `dir`, recursively, sorted by path.
///
/// A missing directory is an empty corpus. Files that are not valid UTF-8
/// are skipped with a warning.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "documentation directory not found");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut docs = Vec::new();
    for path in files {
        let bytes = std::fs::read(&path)?;
        let Ok(text) = String::from_utf8(bytes) else {
            tracing::warn!(path = %path.display(), "skipping non-UTF-8 document");
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        let source = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        docs.push(Document { source, text });
    }
    Ok(docs)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChunk {
    pub source: String,
    pub text: String,
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t\r]*\n").unwrap())
}

/// Pack paragraphs into chunks of at most `max_chars` characters.
///
/// Paragraphs are never merged across documents. A paragraph longer than
/// `max_chars` is hard-split on character boundaries.
pub fn chunk_documents(docs: &[Document], max_chars: usize) -> Vec<DocChunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for doc in docs {
        let mut current = String::new();
        let mut current_len = 0usize;

        let mut flush = |current: &mut String, current_len: &mut usize| {
            if !current.is_empty() {
                chunks.push(DocChunk {
                    source: doc.source.clone(),
                    text: std::mem::take(current),
                });
            }
            *current_len = 0;
        };

        for para in paragraph_break_re().split(&doc.text) {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }
            let len = para.chars().count();

            if len > max_chars {
                flush(&mut current, &mut current_len);
                let chars: Vec<char> = para.chars().collect();
                for piece in chars.chunks(max_chars) {
                    current = piece.iter().collect();
                    flush(&mut current, &mut current_len);
                }
                continue;
            }

            if current_len > 0 && current_len + 2 + len > max_chars {
                flush(&mut current, &mut current_len);
            }
            if current_len > 0 {
                current.push_str("\n\n");
                current_len += 2;
            }
            current.push_str(para);
            current_len += len;
        }
        flush(&mut current, &mut current_len);
    }

    chunks
}

/// Stable identity of a corpus as embedded by `model`.
pub fn fingerprint(model: &str, chunk_chars: usize, chunks: &[DocChunk]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update((chunk_chars as u64).to_le_bytes());
    for chunk in chunks {
        hasher.update(chunk.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(chunk.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// VectorIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct Retrieved<'a> {
    pub score: f32,
    pub entry: &'a IndexEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    pub model: String,
    pub fingerprint: String,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Pair each chunk with its embedding. Extra items on either side are
    /// dropped.
    pub fn new(
        model: impl Into<String>,
        fingerprint: impl Into<String>,
        chunks: Vec<DocChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Self {
        if chunks.len() != embeddings.len() {
            tracing::warn!(
                chunks = chunks.len(),
                embeddings = embeddings.len(),
                "chunk/embedding count mismatch"
            );
        }
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                source: chunk.source,
                text: chunk.text,
                embedding,
            })
            .collect();
        Self {
            model: model.into(),
            fingerprint: fingerprint.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `top_k` entries most similar to `query`, best first. Ties keep
    /// corpus order.
    pub fn retrieve(&self, query: &[f32], top_k: usize) -> Vec<Retrieved<'_>> {
        let mut scored: Vec<Retrieved<'_>> = self
            .entries
            .iter()
            .map(|entry| Retrieved {
                score: cosine_similarity(query, &entry.embedding),
                entry,
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    /// Load a cached index; `None` when no cache exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec(self)?;
        crate::io::atomic_write(path, &data)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Retrieved passages joined into the documentation block of the review prompt.
pub fn join_context(retrieved: &[Retrieved<'_>]) -> String {
    retrieved
        .iter()
        .map(|r| r.entry.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(source: &str, text: &str) -> Document {
        Document {
            source: source.into(),
            text: text.into(),
        }
    }

    fn chunk(text: &str) -> DocChunk {
        DocChunk {
            source: "a.md".into(),
            text: text.into(),
        }
    }

    #[test]
    fn load_documents_walks_sorted_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("security")).unwrap();
        std::fs::write(dir.path().join("b.md"), "beta").unwrap();
        std::fs::write(dir.path().join("a.md"), "alpha").unwrap();
        std::fs::write(dir.path().join("security/cors.md"), "cors").unwrap();
        std::fs::write(dir.path().join(".hidden.md"), "secret").unwrap();
        std::fs::write(dir.path().join("empty.md"), "  \n").unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let sources: Vec<_> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "b.md", "security/cors.md"]);
    }

    #[test]
    fn load_documents_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_documents(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn chunking_packs_paragraphs() {
        let docs = [doc("a.md", "one\n\ntwo\n\n\nthree")];
        let chunks = chunk_documents(&docs, 10);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one\n\ntwo", "three"]);
    }

    #[test]
    fn chunking_hard_splits_long_paragraphs() {
        let docs = [doc("a.md", "short\n\nabcdefghij")];
        let chunks = chunk_documents(&docs, 4);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["shor", "t", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunking_never_merges_documents() {
        let docs = [doc("a.md", "a"), doc("b.md", "b")];
        let chunks = chunk_documents(&docs, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].source, "b.md");
    }

    #[test]
    fn fingerprint_changes_with_content_and_model() {
        let a = fingerprint("m", 10, &[chunk("x")]);
        assert_eq!(a, fingerprint("m", 10, &[chunk("x")]));
        assert_ne!(a, fingerprint("m", 10, &[chunk("y")]));
        assert_ne!(a, fingerprint("other", 10, &[chunk("x")]));
        assert_ne!(a, fingerprint("m", 11, &[chunk("x")]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn cosine_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn retrieve_ranks_by_similarity() {
        let index = VectorIndex::new(
            "m",
            "fp",
            vec![chunk("cors"), chunk("jwt"), chunk("sql")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        );
        let hits = index.retrieve(&[0.0, 1.0], 2);
        let texts: Vec<_> = hits.iter().map(|h| h.entry.text.as_str()).collect();
        assert_eq!(texts, vec!["jwt", "sql"]);
        assert_eq!(join_context(&hits), "jwt\n\nsql");
    }

    #[test]
    fn retrieve_ties_keep_corpus_order() {
        let index = VectorIndex::new(
            "m",
            "fp",
            vec![chunk("first"), chunk("second")],
            vec![vec![1.0], vec![1.0]],
        );
        let hits = index.retrieve(&[1.0], 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.text, "first");
    }

    #[test]
    fn new_drops_unpaired_items() {
        let index = VectorIndex::new("m", "fp", vec![chunk("a"), chunk("b")], vec![vec![1.0]]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn save_and_load_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".spitcode/index.json");
        assert!(VectorIndex::load(&path).unwrap().is_none());
        let index = VectorIndex::new("m", "fp", vec![chunk("a")], vec![vec![0.5, 0.25]]);
        index.save(&path).unwrap();
        assert_eq!(VectorIndex::load(&path).unwrap(), Some(index));
    }
}
