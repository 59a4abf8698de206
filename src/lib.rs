//! Charla - Grounded practice exercises from lesson transcripts
//!
//! A local-first CLI tool for turning instructional dialogue transcripts into a
//! semantically searchable practice base.
//!
//! The name "Charla" comes from the Spanish word for "chat" or "informal talk."
//!
//! # Overview
//!
//! Charla allows you to:
//! - Structure raw lesson transcripts into introduction / conversation / Q&A records
//! - Build a searchable vector store from the structured fragments
//! - Generate new listening-comprehension exercises grounded in retrieved context
//! - Search the indexed fragments semantically
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt template management
//! - `transcript` - Transcript records and on-disk library
//! - `structurer` - Raw transcript to structured record conversion
//! - `json_extract` - Layered JSON recovery for model responses
//! - `embedding` - Embedding generation
//! - `generation` - Generative model abstraction
//! - `vector_store` - Vector store abstraction
//! - `ingest` - Decomposition and indexing pipeline
//! - `exercise` - Retrieval-augmented exercise generation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use charla::config::Settings;
//! use charla::exercise::ExerciseRequest;
//! use charla::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.ensure_ingested().await?;
//!
//!     let request = ExerciseRequest::new("daily routines", "comprehension");
//!     let exercise = orchestrator.generate_exercise(&request).await?;
//!     println!("{}", exercise.context);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod exercise;
pub mod generation;
pub mod ingest;
pub mod json_extract;
pub mod openai;
pub mod orchestrator;
pub mod structurer;
pub mod transcript;
pub mod vector_store;

pub use error::{CharlaError, Result};
