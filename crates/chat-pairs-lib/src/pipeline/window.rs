//! Context window construction.
//!
//! Anchors are visited newest first. Each unconsumed anchor opens a window
//! that grows backward through the sorted messages until one of these holds:
//! - the window reached `max_window` messages;
//! - there is no earlier message;
//! - the earlier message is more than `decay_seconds` older than the anchor
//!   (the anchor's timestamp is the fixed reference, not the last message
//!   added);
//! - the earlier message is already consumed;
//! - the earlier message would be a second change of speaker.
//!
//! Every message placed in a window is recorded in the builder's consumed
//! set, so no message feeds two windows. An anchor already absorbed by a
//! newer window produces nothing.

use std::collections::HashSet;

use crate::model::message::{Message, MessageId, SenderId};

/// Messages of one exchange, anchor first, then its predecessors newest to
/// oldest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow<'a> {
    anchor_position: usize,
    messages: Vec<&'a Message>,
}

impl<'a> ContextWindow<'a> {
    /// Position of the anchor in the sorted message slice.
    pub fn anchor_position(&self) -> usize {
        self.anchor_position
    }

    pub fn anchor(&self) -> &'a Message {
        self.messages[0]
    }

    /// Reverse-chronological: `messages()[0]` is the anchor.
    pub fn messages(&self) -> &[&'a Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.messages.iter().map(|m| m.id)
    }
}

/// Lazy window builder over a sorted, filtered message slice.
///
/// The iterator owns the consumed set for this one invocation; building
/// windows for another conversation needs a fresh `ContextWindows`.
pub struct ContextWindows<'a> {
    messages: &'a [&'a Message],
    anchors: std::iter::Rev<std::vec::IntoIter<usize>>,
    max_window: usize,
    decay_seconds: i64,
    consumed: HashSet<MessageId>,
    skipped_anchors: usize,
}

impl<'a> ContextWindows<'a> {
    /// # Arguments
    ///
    /// * `messages` - chronologically sorted text messages
    /// * `anchors` - positions of target-speaker messages in `messages`
    /// * `max_window` - maximum window size, anchor included
    /// * `decay_seconds` - maximum age of a predecessor relative to the anchor
    pub fn new(
        messages: &'a [&'a Message],
        mut anchors: Vec<usize>,
        max_window: usize,
        decay_seconds: i64,
    ) -> Self {
        anchors.sort_unstable();
        anchors.dedup();
        debug_assert!(
            anchors.last().map_or(true, |&p| p < messages.len()),
            "anchor position out of range"
        );
        ContextWindows {
            messages,
            anchors: anchors.into_iter().rev(),
            max_window,
            decay_seconds,
            consumed: HashSet::new(),
            skipped_anchors: 0,
        }
    }

    /// Anchors skipped so far because a newer window had already absorbed them.
    pub fn skipped_anchors(&self) -> usize {
        self.skipped_anchors
    }

    /// Messages placed in a window so far.
    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    fn build(&mut self, position: usize) -> ContextWindow<'a> {
        let anchor = self.messages[position];
        let mut window = Vec::with_capacity(self.max_window.min(position + 1));
        window.push(anchor);
        self.consumed.insert(anchor.id);

        let mut current_speaker: &SenderId = &anchor.sender;
        let mut turn_switched = false;
        let mut back = 1;

        while window.len() < self.max_window {
            let Some(candidate_pos) = position.checked_sub(back) else {
                break;
            };
            let candidate = self.messages[candidate_pos];

            if anchor.timestamp.saturating_sub(candidate.timestamp) > self.decay_seconds {
                break;
            }
            if self.consumed.contains(&candidate.id) {
                break;
            }
            if candidate.sender != *current_speaker {
                if turn_switched {
                    break;
                }
                turn_switched = true;
                current_speaker = &candidate.sender;
            }

            window.push(candidate);
            self.consumed.insert(candidate.id);
            back += 1;
        }

        tracing::debug!(
            anchor_id = anchor.id,
            anchor_position = position,
            size = window.len(),
            turn_switched,
            "built context window"
        );

        ContextWindow {
            anchor_position: position,
            messages: window,
        }
    }
}

impl<'a> Iterator for ContextWindows<'a> {
    type Item = ContextWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.anchors.next()?;
            if self.consumed.contains(&self.messages[position].id) {
                self.skipped_anchors += 1;
                continue;
            }
            return Some(self.build(position));
        }
    }
}
