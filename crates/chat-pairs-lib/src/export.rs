//! Typed view of a Telegram Desktop JSON export.
//!
//! Only the fields the pairing pipeline reads are modelled; everything else
//! in the export (reactions, polls, contact cards, ...) is ignored by serde.
//! Two document shapes exist in the wild: a single-chat export produced from
//! a chat's context menu, and a full account export whose chats live under
//! `chats.list`. Both are accepted.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PairsError, Result};

/// Chat type Telegram uses for one-to-one conversations.
pub const PERSONAL_CHAT: &str = "personal_chat";

/// A formatted span of message text (`bold`, `link`, `plain`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct TextEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// One message record as exported.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportMessage {
    pub id: i64,
    /// `"message"` or `"service"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub date: Option<String>,
    /// Send time as a decimal string of epoch seconds.
    pub date_unixtime: String,
    #[serde(rename = "from")]
    pub from_name: Option<String>,
    pub from_id: Option<String>,
    pub reply_to_message_id: Option<i64>,
    pub edited_unixtime: Option<String>,
    /// Absent on some service records; an empty list is filtered out later.
    #[serde(default)]
    pub text_entities: Vec<TextEntity>,
    pub media_type: Option<String>,
    pub photo: Option<String>,
}

impl ExportMessage {
    /// Parse `date_unixtime` into epoch seconds.
    pub fn unix_time(&self) -> Result<i64> {
        self.date_unixtime.trim().parse::<i64>().map_err(|_| {
            PairsError::validation(format!(
                "message {}: date_unixtime '{}' is not an integer",
                self.id, self.date_unixtime
            ))
        })
    }
}

/// A single chat with its messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatExport {
    /// Chat identifier. Absent in some hand-trimmed exports; the pipeline
    /// reports that as a configuration problem rather than a parse failure.
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub messages: Vec<ExportMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatList {
    #[serde(default)]
    pub about: Option<String>,
    pub list: Vec<ChatExport>,
}

/// Full account export: only the chat sections are read.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountExport {
    pub chats: ChatList,
    #[serde(default)]
    pub left_chats: Option<ChatList>,
}

#[derive(Debug, Clone)]
pub enum ExportDocument {
    Chat(ChatExport),
    Account(AccountExport),
}

/// Parse an export document from a JSON string.
///
/// # Errors
///
/// `PairsError::Validation` when the text is not JSON or a required field is
/// missing or has the wrong type.
pub fn parse_export(json: &str) -> Result<ExportDocument> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| PairsError::validation(format!("malformed export JSON: {e}")))?;

    if value.get("chats").is_some() {
        let account: AccountExport = serde_json::from_value(value)
            .map_err(|e| PairsError::validation(format!("invalid account export: {e}")))?;
        Ok(ExportDocument::Account(account))
    } else {
        let chat: ChatExport = serde_json::from_value(value)
            .map_err(|e| PairsError::validation(format!("invalid chat export: {e}")))?;
        Ok(ExportDocument::Chat(chat))
    }
}

/// Read and parse an export file.
pub fn load_export(path: &Path) -> Result<ExportDocument> {
    let raw = fs::read_to_string(path)?;
    let doc = parse_export(&raw)?;
    tracing::debug!(path = %path.display(), chats = doc.chat_count(), "loaded export");
    Ok(doc)
}

impl ExportDocument {
    pub fn chat_count(&self) -> usize {
        match self {
            ExportDocument::Chat(_) => 1,
            ExportDocument::Account(acc) => {
                acc.chats.list.len() + acc.left_chats.as_ref().map_or(0, |l| l.list.len())
            }
        }
    }

    /// Pick the chat to convert.
    ///
    /// - Single-chat documents return their chat; an explicit `chat_id` must
    ///   match it.
    /// - Account exports need `chat_id` unless exactly one personal chat is
    ///   present. Left chats are searched after active ones.
    ///
    /// # Errors
    ///
    /// `PairsError::Configuration` when the requested chat cannot be found or
    /// the choice is ambiguous.
    pub fn select_chat(self, chat_id: Option<i64>) -> Result<ChatExport> {
        match self {
            ExportDocument::Chat(chat) => match (chat_id, chat.id) {
                (Some(wanted), Some(found)) if wanted != found => Err(PairsError::configuration(
                    format!("export holds chat {found}, not the requested chat {wanted}"),
                )),
                _ => Ok(chat),
            },
            ExportDocument::Account(acc) => {
                let all = acc
                    .chats
                    .list
                    .into_iter()
                    .chain(acc.left_chats.into_iter().flat_map(|l| l.list));

                if let Some(wanted) = chat_id {
                    return all.into_iter().find(|c| c.id == Some(wanted)).ok_or_else(|| {
                        PairsError::configuration(format!("chat {wanted} not found in export"))
                    });
                }

                let mut personal: Vec<ChatExport> = all
                    .filter(|c| c.kind.as_deref() == Some(PERSONAL_CHAT))
                    .collect();
                match personal.len() {
                    1 => Ok(personal.remove(0)),
                    0 => Err(PairsError::configuration(
                        "account export has no personal chat; pass a chat id",
                    )),
                    n => Err(PairsError::configuration(format!(
                        "account export has {n} personal chats; pass a chat id"
                    ))),
                }
            }
        }
    }
}
