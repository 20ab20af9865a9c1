//! Library entry point for turning chat exports into question/answer pairs.
//!
//! The crate loads a Telegram JSON export into a [`Conversation`], runs the
//! [`Pipeline`] over it (filter, sort, anchor location, context windows,
//! merging) and writes the resulting [`QaPair`]s with [`sink::write_pairs`].
//!
//! ```no_run
//! use chat_pairs::{load_conversation, sink, AppConfig, Pipeline};
//! use std::path::Path;
//!
//! # fn main() -> chat_pairs::Result<()> {
//! let cfg = AppConfig::default();
//! let conversation = load_conversation(Path::new("result.json"), None)?;
//! let out = Pipeline::new(cfg.pipeline.clone())?.run(&conversation)?;
//! sink::write_pairs(&cfg.output.path, cfg.output.format, out.pairs, None)?;
//! # Ok(())
//! # }
//! ```
//
// Public modules
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod sink;

// Re-export primary types for ergonomic use.
pub use config::{AppConfig, ConcatOrder, OutputConfig, OutputFormat, PipelineConfig};
pub use error::{PairsError, Result};
pub use model::{
    conversation::{target_tag, Conversation},
    message::{MediaMarkers, Message, MessageId, SenderId},
    qa_pair::QaPair,
};
pub use pipeline::{ContextWindow, ContextWindows, Pipeline, PipelineOutput, PipelineStats};

use std::path::Path;

/// Load an export file and convert the selected chat into a [`Conversation`].
///
/// # Arguments
///
/// * `path` - Telegram export JSON (single chat or full account export)
/// * `chat_id` - chat to select; optional for single-chat exports
///
/// # Errors
///
/// `PairsError::Validation` for malformed exports, `PairsError::Configuration`
/// when the chat cannot be selected, `PairsError::Io` when the file cannot be read.
pub fn load_conversation(path: &Path, chat_id: Option<i64>) -> Result<Conversation> {
    let chat = export::load_export(path)?.select_chat(chat_id)?;
    Conversation::from_export(chat)
}

/// Parse an export held in memory; see [`load_conversation`].
pub fn parse_conversation(json: &str, chat_id: Option<i64>) -> Result<Conversation> {
    let chat = export::parse_export(json)?.select_chat(chat_id)?;
    Conversation::from_export(chat)
}
