//! Griot - Oral History Archive Companion
//!
//! Backend library for a cultural-heritage video archive.
//!
//! # Overview
//!
//! Griot allows you to:
//! - Filter the video catalog by free text, tags, people and location
//! - Rank tags and people by popularity for the browsing sidebar
//! - Talk with The Griot, a storytelling assistant backed by Ollama, vLLM,
//!   llama.cpp or a hosted inference endpoint, with streamed replies
//!
//! # Architecture
//!
//! - `catalog` - Video records, facet ranking and filtering
//! - `llm` - Provider-neutral chat adapter with streaming
//! - `config` - Configuration and prompt templates
//! - `cli` - Command-line interface and HTTP API server
//!
//! # Example
//!
//! ```rust,no_run
//! use griot::catalog::{Catalog, VideoQuery};
//!
//! fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::load(std::path::Path::new("metadata/videos.yaml"))?;
//!
//!     let query = VideoQuery::new().with_text("quilt").with_facet("Heritage");
//!     for video in catalog.search(&query) {
//!         println!("{} ({})", video.title, video.created_date);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{GriotError, ProviderError, Result};
