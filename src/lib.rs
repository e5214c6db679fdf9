//! Referat - Meeting Follow-up Service
//!
//! Turns a meeting's audio or transcript into a summary and a set of action
//! items, and serves the results over HTTP.
//!
//! The name "Referat" comes from the Norwegian word for "meeting minutes."
//!
//! # Overview
//!
//! Referat allows you to:
//! - Submit a transcript or an audio file (local path or URL) as a Meeting
//! - Transcribe audio via AssemblyAI or a local Whisper model
//! - Generate a short summary and structured action items with Gemini
//! - Poll meeting status while processing runs in a background worker pool
//! - Integrate with a Supervisor orchestrator through a fixed envelope API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `transcription` - Speech-to-text providers
//! - `summarize` - Transcript summarization
//! - `action_items` - Action item extraction
//! - `store` - Meeting persistence
//! - `orchestrator` - Pipeline coordination
//! - `runner` - Background job execution
//! - `http` - REST and Supervisor protocol adapters
//!
//! # Example
//!
//! ```rust,no_run
//! use referat::config::Settings;
//! use referat::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Process a previously created meeting through the pipeline
//!     let meeting_id = orchestrator.process_meeting(1).await?;
//!     println!("Processed meeting {}", meeting_id);
//!
//!     Ok(())
//! }
//! ```

pub mod action_items;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod http;
pub mod orchestrator;
pub mod runner;
pub mod storage;
pub mod store;
pub mod summarize;
pub mod transcription;

pub use error::{ReferatError, Result};
