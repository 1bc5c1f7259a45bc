use anyhow::Result;
use serde_json::json;
use test_utils::thinking_stream_fixture;

use super::tool_call_spans;
use super::Directive;
use super::FrameDecoder;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatState;

fn events(directives: &[Directive]) -> Vec<ChatEvent> {
    return directives
        .iter()
        .filter_map(|directive| {
            if let Directive::Emit(event) = directive {
                return Some(event.clone());
            }
            return None;
        })
        .collect();
}

fn thinking_elapsed(directives: &[Directive]) -> Option<f32> {
    return directives.iter().find_map(|directive| {
        if let Directive::SetState(ChatState::Thinking(elapsed)) = directive {
            return Some(*elapsed);
        }
        return None;
    });
}

mod spans {
    use super::*;

    #[test]
    fn it_finds_a_single_span() {
        assert_eq!(
            tool_call_spans(r#"<tool_call>{"name":"a"}</tool_call>"#),
            vec![r#"{"name":"a"}"#]
        );
    }

    #[test]
    fn it_finds_multiple_spans_non_greedily() {
        let frame = "pre <tool_call>1</tool_call> mid <tool_call>2</tool_call> post";
        assert_eq!(tool_call_spans(frame), vec!["1", "2"]);
    }

    #[test]
    fn it_keeps_multiline_content() {
        let frame = "<tool_call>\n{\"a\": 1}\n</tool_call>";
        assert_eq!(tool_call_spans(frame), vec!["\n{\"a\": 1}\n"]);
    }

    #[test]
    fn it_drops_unterminated_span() {
        let frame = "<tool_call>1</tool_call><tool_call>{\"partial\":";
        assert_eq!(tool_call_spans(frame), vec!["1"]);
    }

    #[test]
    fn it_pairs_with_first_close_marker() {
        let frame = "<tool_call>a<tool_call>b</tool_call>c</tool_call>";
        assert_eq!(tool_call_spans(frame), vec!["a<tool_call>b"]);
    }

    #[test]
    fn it_finds_empty_span() {
        assert_eq!(tool_call_spans("<tool_call></tool_call>"), vec![""]);
    }
}

mod decode {
    use super::*;

    #[test]
    fn it_passes_plain_text_through_verbatim() {
        let mut decoder = FrameDecoder::default();
        let frame = "  Hello <b>world</b>\n";

        assert_eq!(
            decoder.decode_at(frame, 0),
            vec![
                Directive::SetState(ChatState::Responding),
                Directive::Emit(ChatEvent::text(frame, false)),
            ]
        );
    }

    #[test]
    fn it_finishes_on_end_of_stream() {
        let mut decoder = FrameDecoder::default();
        assert_eq!(decoder.decode_at("<EOS>", 0), vec![Directive::Finish]);
    }

    #[test]
    fn it_only_matches_markers_exactly() {
        let mut decoder = FrameDecoder::default();

        assert_eq!(
            events(&decoder.decode_at(" <EOS>", 0)),
            vec![ChatEvent::text(" <EOS>", false)]
        );
        assert_eq!(
            events(&decoder.decode_at("<THINK>", 0)),
            vec![ChatEvent::text("<THINK>", false)]
        );
        assert!(!decoder.is_thinking());
    }

    #[test]
    fn it_tracks_thinking_span() {
        let mut decoder = FrameDecoder::default();

        assert_eq!(
            decoder.decode_at("<think>", 1_000),
            vec![
                Directive::SetState(ChatState::Thinking(0.0)),
                Directive::Emit(ChatEvent::ThinkingStarted),
            ]
        );
        assert!(decoder.is_thinking());

        assert_eq!(
            decoder.decode_at("reasoning", 1_500),
            vec![
                Directive::Emit(ChatEvent::text("reasoning", true)),
                Directive::SetState(ChatState::Thinking(0.5)),
            ]
        );

        assert_eq!(
            decoder.decode_at("</think>", 2_000),
            vec![
                Directive::SetState(ChatState::Responding),
                Directive::Emit(ChatEvent::ThinkingEnded),
            ]
        );
        assert!(!decoder.is_thinking());

        assert_eq!(
            events(&decoder.decode_at("answer", 2_100)),
            vec![ChatEvent::text("answer", false)]
        );
    }

    #[test]
    fn it_measures_elapsed_between_thinking_chunks() {
        let mut decoder = FrameDecoder::default();
        decoder.decode_at("<think>", 0);

        let laps = [(2_000, 2.0), (2_500, 0.5), (2_500, 0.0), (6_000, 3.5)];
        for (now, expected) in laps {
            let elapsed = thinking_elapsed(&decoder.decode_at("chunk", now));
            assert_eq!(elapsed, Some(expected));
        }
    }

    #[test]
    fn it_resets_elapsed_on_new_thinking_span() {
        let mut decoder = FrameDecoder::default();
        decoder.decode_at("<think>", 0);
        decoder.decode_at("chunk", 9_000);
        decoder.decode_at("</think>", 9_000);

        assert_eq!(
            thinking_elapsed(&decoder.decode_at("<think>", 20_000)),
            Some(0.0)
        );
        assert_eq!(
            thinking_elapsed(&decoder.decode_at("chunk", 20_250)),
            Some(0.25)
        );
    }

    #[test]
    fn it_emits_tool_calls_per_span() {
        let mut decoder = FrameDecoder::default();
        let frame =
            r#"<tool_call>{"name":"search","arguments":{"q":"rust"}}</tool_call><tool_call>{"name":"time"}</tool_call>"#;

        assert_eq!(
            events(&decoder.decode_at(frame, 0)),
            vec![
                ChatEvent::ToolCallReceived(json!({"name": "search", "arguments": {"q": "rust"}})),
                ChatEvent::ToolCallReceived(json!({"name": "time"})),
            ]
        );
    }

    #[test]
    fn it_isolates_bad_tool_call_spans() -> Result<()> {
        let mut decoder = FrameDecoder::default();
        let frame = r#"<tool_call>{not json}</tool_call><tool_call> {"name":"ok"} </tool_call>"#;
        let emitted = events(&decoder.decode_at(frame, 0));

        assert_eq!(emitted.len(), 2);
        match &emitted[0] {
            ChatEvent::ErrorOccurred(msg) => assert!(msg.starts_with("Failed to parse tool call")),
            other => anyhow::bail!("Expected error event, got {other:?}"),
        }
        assert_eq!(emitted[1], ChatEvent::ToolCallReceived(json!({"name": "ok"})));

        return Ok(());
    }

    #[test]
    fn it_does_not_change_state_for_tool_calls() {
        let mut decoder = FrameDecoder::default();
        decoder.decode_at("<think>", 0);
        let directives = decoder.decode_at(r#"<tool_call>{"a":1}</tool_call>"#, 10);

        assert!(directives
            .iter()
            .all(|directive| return matches!(directive, Directive::Emit(_))));
        assert!(decoder.is_thinking());
    }

    #[test]
    fn it_ignores_frame_with_only_partial_tool_call() {
        let mut decoder = FrameDecoder::default();
        assert!(decoder.decode_at("<tool_call>{\"a\":", 0).is_empty());
    }

    #[test]
    fn it_forgets_thinking_on_reset() {
        let mut decoder = FrameDecoder::default();
        decoder.decode_at("<think>", 0);
        decoder.reset();

        assert!(!decoder.is_thinking());
        assert_eq!(
            events(&decoder.decode_at("text", 10)),
            vec![ChatEvent::text("text", false)]
        );
    }

    #[test]
    fn it_decodes_fixture_stream() {
        let mut decoder = FrameDecoder::default();
        let emitted = thinking_stream_fixture()
            .iter()
            .flat_map(|frame| return events(&decoder.decode(frame)))
            .collect::<Vec<ChatEvent>>();

        assert_eq!(
            emitted,
            vec![
                ChatEvent::ThinkingStarted,
                ChatEvent::text("reasoning", true),
                ChatEvent::ThinkingEnded,
                ChatEvent::text("hello", false),
            ]
        );
    }
}
