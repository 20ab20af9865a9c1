use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PairsError, Result};
use crate::export::ChatExport;
use crate::model::message::{MediaMarkers, Message, SenderId};

/// Sender tag the export uses for the target speaker of a conversation.
///
/// This is the only place the `"user" + id` convention is spelled out;
/// everything downstream works with [`SenderId`].
pub fn target_tag(conversation_id: i64) -> String {
    format!("user{conversation_id}")
}

/// An identified, ordered collection of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: Option<i64>, name: Option<String>, messages: Vec<Message>) -> Self {
        Conversation { id, name, messages }
    }

    /// Convert an exported chat into a conversation, resolving raw sender
    /// tags into [`SenderId`]s.
    ///
    /// Resolution rules:
    /// - the tag equal to [`target_tag`] of the chat id is `Target`;
    /// - the first other tag in send order (ties broken by input order) is
    ///   `Counterpart`;
    /// - any other tag is `Other(raw)`, even an empty one;
    /// - a missing tag is `Unknown`.
    ///
    /// Messages keep their input order; sorting is a pipeline stage.
    ///
    /// # Errors
    ///
    /// `PairsError::Validation` when a timestamp is not an integer or two
    /// messages share an id.
    pub fn from_export(chat: ChatExport) -> Result<Self> {
        let target = chat.id.map(target_tag);

        let mut seen_ids = HashSet::with_capacity(chat.messages.len());
        let mut timestamps = Vec::with_capacity(chat.messages.len());
        for m in &chat.messages {
            if !seen_ids.insert(m.id) {
                return Err(PairsError::validation(format!(
                    "duplicate message id {} in chat {:?}",
                    m.id, chat.id
                )));
            }
            timestamps.push(m.unix_time()?);
        }

        let mut order: Vec<usize> = (0..chat.messages.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);
        let counterpart: Option<String> = order
            .iter()
            .filter_map(|&i| chat.messages[i].from_id.as_deref())
            .find(|tag| Some(*tag) != target.as_deref())
            .map(str::to_string);

        let resolve = |tag: Option<String>| -> SenderId {
            match tag {
                Some(t) if Some(t.as_str()) == target.as_deref() => SenderId::Target,
                Some(t) if Some(t.as_str()) == counterpart.as_deref() => SenderId::Counterpart,
                Some(t) => SenderId::Other(t),
                None => SenderId::Unknown,
            }
        };

        let messages = chat
            .messages
            .into_iter()
            .zip(timestamps)
            .map(|(m, timestamp)| Message {
                id: m.id,
                sender: resolve(m.from_id),
                timestamp,
                fragments: m.text_entities.into_iter().map(|e| e.text).collect(),
                media: MediaMarkers {
                    media_type: m.media_type,
                    photo: m.photo,
                },
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            chat_id = ?chat.id,
            messages = messages.len(),
            counterpart = ?counterpart,
            "resolved conversation senders"
        );

        Ok(Conversation {
            id: chat.id,
            name: chat.name,
            messages,
        })
    }
}
