//! Corso - Course Materials Assistant
//!
//! A CLI tool and HTTP API for indexing course documents into a searchable
//! knowledge base and answering questions about them with cited sources.
//!
//! # Overview
//!
//! Corso allows you to:
//! - Parse and index structured course documents
//! - Search course content semantically
//! - Ask questions answered through a multi-round tool-calling loop
//! - Track conversation sessions for follow-up questions
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `ingest` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Course storage and semantic search
//! - `llm` - Language model service boundary
//! - `agent` - Tool registry, execution, and the answer-generation loop
//! - `session` - Conversation session tracking
//! - `rag` - Top-level system wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use corso::config::Settings;
//! use corso::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::new(&settings)?;
//!
//!     let response = rag.query("What does lesson 2 cover?", None).await?;
//!     println!("{}", response.answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod session;
pub mod vector_store;

pub use error::{CorsoError, Result};
