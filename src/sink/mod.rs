//! Downstream collaborators
//!
//! Harvested records leave the pipeline through three boundaries, each a
//! trait with a shipped implementation:
//! - [`Embedder`] turns record prompts into vectors ([`OpenAiEmbedder`])
//! - [`BlobStore`] keeps a JSON backup per city ([`LocalBlobStore`])
//! - [`VectorIndex`] receives the vectors by namespace ([`PineconeIndex`])
//!
//! [`FailureLog`] writes the trace of a city whose harvest failed.

mod blob;
mod embedding;
mod failure;
mod traits;
mod vector_index;

pub use blob::LocalBlobStore;
pub use embedding::{embed_records, embedding_prompt, OpenAiEmbedder};
pub use failure::{render_failure, FailureLog};
pub use traits::{BlobStore, Embedder, SinkError, SinkResult, VectorIndex};
pub use vector_index::{build_entries, upsert_batched, PineconeIndex, VectorEntry};
