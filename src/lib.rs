//! # ragdex
//!
//! A local-first RAG indexing and query core. One run takes a set of
//! documents (PDF, text, Markdown), chunks them with a sliding window,
//! embeds the chunks with a locally-run model, builds an exact
//! inner-product index, and answers top-k queries against it. A lexical
//! token-overlap scorer is always available and serves as the fallback
//! whenever the vector path cannot.
//!
//! ## Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`config`] | TOML configuration with defaults and validation |
//! | [`models`] | Core data types: pages, chunks, results, backends |
//! | [`extract`] | Per-page text extraction from input documents |
//! | [`chunker`] | Sliding-window chunking with overlap |
//! | [`embedding`] | Embedding provider, model cache, fallback policy |
//! | [`index`] | Exact inner-product vector index |
//! | [`lexical`] | Token-overlap scoring with phrase bonus |
//! | [`session`] | Per-run pipeline state and shape invariants |
//! | [`search`] | Retrieval dispatch and graceful degradation |
//! | [`ingest`] | Files-to-session pipeline and the `chunks` command |
//!
//! ## Degradation ladder
//!
//! Vector retrieval serves only when every link holds: an embedding
//! backend is compiled in and loadable, the session's matrix is
//! committed and non-degenerate, and an index exists over it. Any
//! missing link drops the query to lexical scoring with a stderr
//! notice. Lexical scoring itself has no dependencies and never
//! degrades further.

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod lexical;
pub mod models;
pub mod search;
pub mod session;
