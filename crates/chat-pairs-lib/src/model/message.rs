// Timestamps are seconds since UNIX epoch (i64), as carried by `date_unixtime`
// in the export. No date/time crate is needed at this layer.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message identifier, unique within one conversation.
pub type MessageId = i64;

/// Who sent a message, resolved once per conversation at load time.
///
/// The export tags senders with strings like `"user42"`; matching those
/// strings throughout the pipeline is error prone, so ingestion turns them
/// into this discriminated form and every later stage matches on variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum SenderId {
    /// The speaker whose replies become training answers.
    Target,
    /// The first non-target speaker met in the conversation.
    Counterpart,
    /// Any further sender tag, kept verbatim.
    Other(String),
    /// No sender tag at all (`from_id` absent from the record).
    Unknown,
}

impl SenderId {
    pub fn is_target(&self) -> bool {
        matches!(self, SenderId::Target)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderId::Target => f.write_str("target"),
            SenderId::Counterpart => f.write_str("counterpart"),
            SenderId::Unknown => f.write_str("unknown"),
            SenderId::Other(raw) => write!(f, "other({raw})"),
        }
    }
}

/// Media markers carried over from the export. Any marker present makes the
/// message non-textual for pairing purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMarkers {
    /// `media_type` of the export record (sticker, voice_message, video_file, ...).
    pub media_type: Option<String>,
    /// Relative path of an attached photo.
    pub photo: Option<String>,
}

impl MediaMarkers {
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none() && self.photo.is_none()
    }
}

/// A single transcript message. Immutable once loaded; downstream stages
/// only ever hold `&Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: SenderId,
    pub timestamp: i64,
    /// Ordered text fragments (the `text` of each export text entity).
    pub fragments: Vec<String>,
    pub media: MediaMarkers,
}

impl Message {
    /// Text of the whole message: fragments joined with a line separator.
    pub fn text(&self) -> String {
        self.fragments.join("\n")
    }

    pub fn has_text(&self) -> bool {
        !self.fragments.is_empty()
    }
}
