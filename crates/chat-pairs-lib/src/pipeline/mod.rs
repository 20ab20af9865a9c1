//! The pairing pipeline: filter, sort, locate anchors, build windows, merge.
//!
//! Every stage borrows the conversation's messages; nothing is copied until
//! the merger produces owned strings.

pub mod anchor;
pub mod filter;
pub mod merge;
pub mod window;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::conversation::Conversation;
use crate::model::message::Message;
use crate::model::qa_pair::QaPair;

pub use anchor::locate_anchors;
pub use filter::{filter_text_messages, is_text_message, sort_chronologically};
pub use merge::{merge_window, merge_windows};
pub use window::{ContextWindow, ContextWindows};

/// Counters describing one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_messages: usize,
    pub text_messages: usize,
    pub anchors: usize,
    pub windows: usize,
    /// Anchors absorbed into a newer window instead of opening their own.
    pub skipped_anchors: usize,
    pub consumed_messages: usize,
    /// Earliest and latest send time among text messages.
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Pairs ordered oldest exchange first.
    pub pairs: Vec<QaPair>,
    pub stats: PipelineStats,
}

/// A validated pipeline configuration ready to run over conversations.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    drop_patterns: Vec<Regex>,
}

impl Pipeline {
    /// # Errors
    ///
    /// `PairsError::Configuration` when the configuration fails validation.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let drop_patterns = config.compiled_drop_patterns()?;
        Ok(Pipeline {
            config,
            drop_patterns,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filtered, chronologically sorted view of a conversation's messages.
    pub fn prepare<'a>(&self, conversation: &'a Conversation) -> Vec<&'a Message> {
        let mut messages = filter_text_messages(&conversation.messages, &self.drop_patterns);
        sort_chronologically(&mut messages);
        messages
    }

    /// Run every stage over one conversation.
    ///
    /// # Errors
    ///
    /// `PairsError::Configuration` when the conversation has no id.
    pub fn run(&self, conversation: &Conversation) -> Result<PipelineOutput> {
        let messages = self.prepare(conversation);
        let anchors = locate_anchors(conversation.id, &messages)?;
        let anchor_count = anchors.len();

        let mut builder = ContextWindows::new(
            &messages,
            anchors,
            self.config.max_window,
            self.config.decay_seconds,
        );
        let mut windows: Vec<ContextWindow<'_>> = builder.by_ref().collect();
        windows.reverse();

        let pairs: Vec<QaPair> = merge_windows(&windows, self.config.concat_order).collect();

        let stats = PipelineStats {
            total_messages: conversation.messages.len(),
            text_messages: messages.len(),
            anchors: anchor_count,
            windows: windows.len(),
            skipped_anchors: builder.skipped_anchors(),
            consumed_messages: builder.consumed_count(),
            first_timestamp: messages.first().map(|m| m.timestamp),
            last_timestamp: messages.last().map(|m| m.timestamp),
        };

        tracing::info!(
            conversation_id = ?conversation.id,
            total = stats.total_messages,
            text = stats.text_messages,
            anchors = stats.anchors,
            windows = stats.windows,
            "pipeline finished"
        );

        Ok(PipelineOutput { pairs, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConcatOrder;
    use crate::error::PairsError;
    use crate::model::message::{MediaMarkers, SenderId};

    fn msg(id: i64, sender: SenderId, ts: i64, text: &str) -> Message {
        Message {
            id,
            sender,
            timestamp: ts,
            fragments: vec![text.to_string()],
            media: MediaMarkers::default(),
        }
    }

    fn config(max_window: usize, decay_seconds: i64) -> PipelineConfig {
        PipelineConfig {
            max_window,
            decay_seconds,
            ..Default::default()
        }
    }

    #[test]
    fn sorts_before_building_windows() {
        // input arrives out of order; the photo message is dropped
        let mut photo = msg(5, SenderId::Counterpart, 1001, "caption");
        photo.media.photo = Some("photos/1.jpg".into());
        let conversation = Conversation::new(
            Some(42),
            None,
            vec![
                msg(4, SenderId::Target, 1005, "good"),
                msg(2, SenderId::Counterpart, 1002, "hello"),
                photo,
                msg(1, SenderId::Target, 1000, "hi"),
                msg(3, SenderId::Counterpart, 1003, "how are you"),
            ],
        );
        let out = Pipeline::new(config(10, 3600)).unwrap().run(&conversation).unwrap();
        assert_eq!(
            out.pairs,
            vec![
                QaPair::new("", "hi"),
                QaPair::new("how are youhello", "good"),
            ]
        );
        assert_eq!(
            out.stats,
            PipelineStats {
                total_messages: 5,
                text_messages: 4,
                anchors: 2,
                windows: 2,
                skipped_anchors: 0,
                consumed_messages: 4,
                first_timestamp: Some(1000),
                last_timestamp: Some(1005),
            }
        );
    }

    #[test]
    fn chronological_toggle_flows_through() {
        let conversation = Conversation::new(
            Some(1),
            None,
            vec![
                msg(1, SenderId::Counterpart, 0, "a"),
                msg(2, SenderId::Counterpart, 1, "b"),
                msg(3, SenderId::Target, 2, "c"),
            ],
        );
        let cfg = PipelineConfig {
            concat_order: ConcatOrder::Chronological,
            ..config(4, 60)
        };
        let out = Pipeline::new(cfg).unwrap().run(&conversation).unwrap();
        assert_eq!(out.pairs, vec![QaPair::new("ab", "c")]);
    }

    #[test]
    fn missing_conversation_id_fails() {
        let conversation = Conversation::new(None, None, vec![msg(1, SenderId::Target, 0, "x")]);
        let err = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&conversation)
            .unwrap_err();
        assert!(matches!(err, PairsError::Configuration(_)));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        assert!(matches!(
            Pipeline::new(config(0, 10)),
            Err(PairsError::Configuration(_))
        ));
    }

    #[test]
    fn empty_conversation_yields_no_pairs() {
        let conversation = Conversation::new(Some(3), None, Vec::new());
        let out = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&conversation)
            .unwrap();
        assert!(out.pairs.is_empty());
        assert_eq!(out.stats.first_timestamp, None);
    }
}
