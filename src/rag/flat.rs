//! Flat on-disk vector index.
//!
//! Directory layout:
//! - `index.json`: manifest (model, dimensions, counts, checksums)
//! - `vectors.bin`: little-endian `f32`, row-major, one L2-normalised row per passage
//! - `docstore.json`: the passages, in row order
//!
//! Search is an exact cosine scan, which is plenty for a single textbook.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::store::{Passage, SearchHit, VectorIndex};
use crate::core::errors::{RagError, RagResult};
use crate::vector_math::{normalize_rows, top_k_by_cosine};

pub const MANIFEST_FILE: &str = "index.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Model that produced the stored vectors; queries must use the same one.
    pub embedding_model: String,
    pub dimensions: usize,
    pub count: usize,
    pub vectors_sha256: String,
    pub docstore_sha256: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    embedding_model: String,
    passages: Vec<Passage>,
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Builds an index from passages and their embeddings (same order, same length).
    pub fn from_embeddings(
        embedding_model: impl Into<String>,
        passages: Vec<Passage>,
        embeddings: Vec<Vec<f32>>,
    ) -> RagResult<Self> {
        if passages.len() != embeddings.len() {
            return Err(RagError::Index(format!(
                "{} passages but {} embeddings",
                passages.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if !passages.is_empty() && dimensions == 0 {
            return Err(RagError::Index("Embeddings must not be empty".to_string()));
        }
        if let Some((row, bad)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != dimensions)
        {
            return Err(RagError::Index(format!(
                "Embedding {} has {} dimensions, expected {}",
                row,
                bad.len(),
                dimensions
            )));
        }

        let flat: Vec<f32> = embeddings.into_iter().flatten().collect();
        let mut vectors = Array2::from_shape_vec((passages.len(), dimensions), flat)
            .map_err(|e| RagError::Index(e.to_string()))?;
        normalize_rows(&mut vectors);

        Ok(Self {
            embedding_model: embedding_model.into(),
            passages,
            vectors,
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Writes the index into `dir`, creating it if needed, and returns the manifest.
    pub fn save(&self, dir: &Path) -> RagResult<IndexManifest> {
        fs::create_dir_all(dir)?;

        let vector_bytes = serialize_vectors(&self.vectors);
        let docstore_bytes = serde_json::to_vec_pretty(&self.passages)
            .map_err(|e| RagError::Index(format!("Failed to encode docstore: {e}")))?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimensions: self.dimensions(),
            count: self.passages.len(),
            vectors_sha256: sha256_hex(&vector_bytes),
            docstore_sha256: sha256_hex(&docstore_bytes),
            created_at: Utc::now(),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RagError::Index(format!("Failed to encode manifest: {e}")))?;

        fs::write(dir.join(VECTORS_FILE), vector_bytes)?;
        fs::write(dir.join(DOCSTORE_FILE), docstore_bytes)?;
        // Manifest last: a directory without one is never mistaken for a complete index.
        fs::write(dir.join(MANIFEST_FILE), manifest_bytes)?;

        tracing::info!(
            "Saved index with {} passages ({} dims) to {}",
            manifest.count,
            manifest.dimensions,
            dir.display()
        );
        Ok(manifest)
    }

    /// Loads an index directory.
    ///
    /// Sizes are always checked. Checksums are verified unless
    /// `allow_dangerous_deserialization` is set.
    pub fn load(dir: &Path, allow_dangerous_deserialization: bool) -> RagResult<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(RagError::Index(format!(
                "No index manifest at {}",
                manifest_path.display()
            )));
        }

        let manifest: IndexManifest = serde_json::from_slice(&fs::read(&manifest_path)?)
            .map_err(|e| RagError::Index(format!("Invalid manifest: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RagError::Index(format!(
                "Unsupported index format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let vector_bytes = fs::read(dir.join(VECTORS_FILE))?;
        let docstore_bytes = fs::read(dir.join(DOCSTORE_FILE))?;

        if allow_dangerous_deserialization {
            tracing::warn!(
                "Loading index from {} without integrity verification",
                dir.display()
            );
        } else {
            verify_checksum(VECTORS_FILE, &vector_bytes, &manifest.vectors_sha256)?;
            verify_checksum(DOCSTORE_FILE, &docstore_bytes, &manifest.docstore_sha256)?;
        }

        let expected_len = manifest
            .count
            .checked_mul(manifest.dimensions)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                RagError::Index(format!(
                    "Manifest shape {}x{} is too large",
                    manifest.count, manifest.dimensions
                ))
            })?;
        if vector_bytes.len() != expected_len {
            return Err(RagError::Index(format!(
                "{} is {} bytes, expected {}",
                VECTORS_FILE,
                vector_bytes.len(),
                expected_len
            )));
        }

        let passages: Vec<Passage> = serde_json::from_slice(&docstore_bytes)
            .map_err(|e| RagError::Index(format!("Invalid docstore: {e}")))?;
        if passages.len() != manifest.count {
            return Err(RagError::Index(format!(
                "Docstore holds {} passages, manifest says {}",
                passages.len(),
                manifest.count
            )));
        }

        let vectors = Array2::from_shape_vec(
            (manifest.count, manifest.dimensions),
            deserialize_vectors(&vector_bytes),
        )
        .map_err(|e| RagError::Index(e.to_string()))?;

        Ok(Self {
            embedding_model: manifest.embedding_model,
            passages,
            vectors,
        })
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query_embedding: &[f32], k: usize) -> RagResult<Vec<SearchHit>> {
        if self.passages.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = top_k_by_cosine(self.vectors.view(), query_embedding, k)?;
        Ok(ranked
            .into_iter()
            .map(|(row, score)| SearchHit {
                passage: self.passages[row].clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.passages.len()
    }
}

fn serialize_vectors(vectors: &Array2<f32>) -> Vec<u8> {
    vectors.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_vectors(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn verify_checksum(file: &str, bytes: &[u8], expected: &str) -> RagResult<()> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(RagError::Index(format!(
            "Checksum mismatch for {file}: expected {expected}, got {actual}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatIndex {
        let passages = vec![
            Passage::new("doc_0", "অনুপম তার মামাকে ভাগ্য দেবতা বলেছে।"),
            Passage::new("doc_1", "Kalyani was fifteen at the time of the wedding."),
            Passage::new("doc_2", "Shumbhunath Sen is Kalyani's father."),
        ];
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.0, 2.0, 0.0], vec![0.0, 1.0, 1.0]];
        FlatIndex::from_embeddings("test-model", passages, embeddings).expect("index builds")
    }

    #[test]
    fn search_orders_by_similarity_and_caps_at_k() {
        let index = sample_index();
        let hits = index.search(&[0.0, 1.0, 0.1], 2).expect("search works");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.id, "doc_1");
        assert_eq!(hits[1].passage.id, "doc_2");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = FlatIndex::from_embeddings("test-model", Vec::new(), Vec::new())
            .expect("empty index builds");
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 3).expect("search works").is_empty());
    }

    #[test]
    fn mismatched_embedding_rows_are_rejected() {
        let passages = vec![Passage::new("a", "a"), Passage::new("b", "b")];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0]];
        assert!(FlatIndex::from_embeddings("m", passages, embeddings).is_err());
    }

    #[test]
    fn wrong_query_dimension_is_an_error() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0], 3).is_err());
    }

    #[test]
    fn save_then_load_preserves_search_results() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index = sample_index();
        let manifest = index.save(dir.path()).expect("save works");
        assert_eq!(manifest.count, 3);
        assert_eq!(manifest.dimensions, 3);

        let loaded = FlatIndex::load(dir.path(), false).expect("load works");
        assert_eq!(loaded.embedding_model(), "test-model");
        assert_eq!(loaded.passages(), index.passages());

        let query = [0.1, 0.0, 1.0];
        let before = index.search(&query, 3).expect("search works");
        let after = loaded.search(&query, 3).expect("search works");
        let ids = |hits: &[SearchHit]| hits.iter().map(|h| h.passage.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&before), ids(&after));
    }

    #[test]
    fn tampered_docstore_needs_dangerous_mode() {
        let dir = tempfile::tempdir().expect("temp dir");
        sample_index().save(dir.path()).expect("save works");

        let docstore = dir.path().join(DOCSTORE_FILE);
        let mut passages: Vec<Passage> =
            serde_json::from_slice(&fs::read(&docstore).unwrap()).unwrap();
        passages[0].text = "rewritten".to_string();
        fs::write(&docstore, serde_json::to_vec(&passages).unwrap()).unwrap();

        let err = FlatIndex::load(dir.path(), false).unwrap_err().to_string();
        assert!(err.contains("Checksum mismatch"), "{err}");

        let loaded = FlatIndex::load(dir.path(), true).expect("dangerous load skips checksums");
        assert_eq!(loaded.passages()[0].text, "rewritten");
    }

    #[test]
    fn truncated_vectors_fail_even_in_dangerous_mode() {
        let dir = tempfile::tempdir().expect("temp dir");
        sample_index().save(dir.path()).expect("save works");
        fs::write(dir.path().join(VECTORS_FILE), [0u8; 8]).unwrap();

        assert!(FlatIndex::load(dir.path(), true).is_err());
    }

    #[test]
    fn oversized_manifest_shape_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut manifest = sample_index().save(dir.path()).expect("save works");
        manifest.count = usize::MAX / 2;
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();

        let err = FlatIndex::load(dir.path(), true).unwrap_err().to_string();
        assert!(err.contains("too large"), "{err}");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = FlatIndex::load(&dir.path().join("nope"), true).unwrap_err();
        assert!(err.to_string().contains("No index manifest"));
    }
}
