#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game history persistence and replay.
//!
//! A finished session is captured as a [`GameHistory`] document: metadata,
//! the generated map and path, and a timestamped event log. Documents can be
//! saved and loaded as JSON or XML with full round-trip fidelity, recorded
//! live through a [`HistoryRecorder`], and played back at variable speed
//! through a [`HistoryPlayer`] driving a [`ReplaySink`].

mod document;
mod player;
mod recorder;
mod xml;

pub use document::{load_json, save_json, DataValue, GameHistory, HistoryEvent};
pub use player::{HistoryPlayer, ReplaySink};
pub use recorder::HistoryRecorder;
pub use xml::{load_xml, save_xml};

use thiserror::Error;

/// Failures surfaced while encoding, decoding, or reading history documents.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// JSON serialization or deserialization failed.
    #[error("json history error: {0}")]
    Json(#[from] serde_json::Error),
    /// XML serialization or deserialization failed.
    #[error("xml history error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The document was structurally valid but carried nonsense values.
    #[error("malformed history document: {0}")]
    Malformed(String),
    /// Reading or writing the backing file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
