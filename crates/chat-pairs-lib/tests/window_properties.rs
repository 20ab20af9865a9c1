use chat_pairs::pipeline::locate_anchors;
use chat_pairs::{
    ContextWindows, Conversation, MediaMarkers, Message, Pipeline, PipelineConfig, SenderId,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn sender(code: u8) -> SenderId {
    match code {
        0 => SenderId::Target,
        1 => SenderId::Counterpart,
        2 => SenderId::Other("user7".to_string()),
        _ => SenderId::Other("user8".to_string()),
    }
}

/// Chronologically ordered messages with random senders and time gaps.
fn arb_messages() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec((0u8..4, 0i64..120), 0..40).prop_map(|specs| {
        let mut ts = 1_700_000_000i64;
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (code, gap))| {
                ts += gap;
                Message {
                    id: i as i64 + 1,
                    sender: sender(code),
                    timestamp: ts,
                    fragments: vec![format!("m{i}")],
                    media: MediaMarkers::default(),
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn windows_satisfy_invariants(
        messages in arb_messages(),
        max_window in 1usize..8,
        decay_seconds in 0i64..300,
    ) {
        let refs: Vec<&Message> = messages.iter().collect();
        let anchors = locate_anchors(Some(1), &refs).unwrap();
        let anchor_count = anchors.len();

        let mut builder = ContextWindows::new(&refs, anchors, max_window, decay_seconds);
        let windows: Vec<_> = builder.by_ref().collect();

        let mut seen = HashSet::new();
        for w in &windows {
            // bounded size
            prop_assert!(!w.is_empty() && w.len() <= max_window);

            let anchor = w.anchor();
            prop_assert!(anchor.sender.is_target());
            prop_assert_eq!(refs[w.anchor_position()].id, anchor.id);

            for m in w.messages() {
                // partition
                prop_assert!(seen.insert(m.id), "message {} in two windows", m.id);
                // decay bound
                prop_assert!(anchor.timestamp - m.timestamp <= decay_seconds);
            }

            // turn cap
            let speakers: HashSet<&SenderId> = w.messages().iter().map(|m| &m.sender).collect();
            prop_assert!(speakers.len() <= 2);

            // reverse-chronological internal order
            for pair in w.messages().windows(2) {
                prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            }
        }

        // every anchor is either a window or absorbed by a newer one
        prop_assert_eq!(windows.len() + builder.skipped_anchors(), anchor_count);
        prop_assert_eq!(builder.consumed_count(), seen.len());

        // windows come out newest anchor first
        for pair in windows.windows(2) {
            prop_assert!(pair[0].anchor_position() > pair[1].anchor_position());
        }
    }

    #[test]
    fn pipeline_is_deterministic(
        messages in arb_messages(),
        max_window in 1usize..8,
        decay_seconds in 0i64..300,
    ) {
        let conversation = Conversation::new(Some(1), None, messages);
        let pipeline = Pipeline::new(PipelineConfig {
            max_window,
            decay_seconds,
            ..Default::default()
        })
        .unwrap();
        let first = pipeline.run(&conversation).unwrap();
        let second = pipeline.run(&conversation.clone()).unwrap();
        prop_assert_eq!(first.pairs, second.pairs);
        prop_assert_eq!(first.stats, second.stats);
    }
}
