//! Retrieval side of the pipeline.
//!
//! - `VectorIndex`: similarity search over stored passages
//! - `FlatIndex`: the on-disk, brute-force implementation loaded at startup

mod flat;
mod store;

pub use flat::{FlatIndex, IndexManifest, DOCSTORE_FILE, MANIFEST_FILE, VECTORS_FILE};
pub use store::{Passage, SearchHit, VectorIndex};
