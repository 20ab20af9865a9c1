use regex::Regex;

use crate::model::message::Message;

/// Whether a message can take part in a text pair.
///
/// A message is excluded when it carries a media or photo marker, when it has
/// no text fragments, or when its text matches one of `drop_patterns`.
pub fn is_text_message(message: &Message, drop_patterns: &[Regex]) -> bool {
    if !message.media.is_empty() || !message.has_text() {
        return false;
    }
    if drop_patterns.is_empty() {
        return true;
    }
    let text = message.text();
    !drop_patterns.iter().any(|re| re.is_match(&text))
}

/// Keep text messages, preserving their relative order.
pub fn filter_text_messages<'a, I>(messages: I, drop_patterns: &[Regex]) -> Vec<&'a Message>
where
    I: IntoIterator<Item = &'a Message>,
{
    messages
        .into_iter()
        .filter(|m| is_text_message(m, drop_patterns))
        .collect()
}

/// Order messages by send time ascending. Equal timestamps keep input order.
pub fn sort_chronologically(messages: &mut [&Message]) {
    messages.sort_by_key(|m| m.timestamp);
}
