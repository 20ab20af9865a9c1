use crate::error::{PairsError, Result};
use crate::model::message::Message;

/// Positions of the target speaker's messages, ascending.
///
/// `messages` is the filtered, sorted view of the conversation identified by
/// `conversation_id`; positions index into that slice.
///
/// # Errors
///
/// `PairsError::Configuration` when the conversation has no id, since the
/// target speaker cannot be derived without one.
pub fn locate_anchors(conversation_id: Option<i64>, messages: &[&Message]) -> Result<Vec<usize>> {
    if conversation_id.is_none() {
        return Err(PairsError::configuration(
            "conversation id is required to identify the target speaker",
        ));
    }
    Ok(messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.sender.is_target())
        .map(|(i, _)| i)
        .collect())
}
