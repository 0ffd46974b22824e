//! Sidecar Parsing Integration Tests
//!
//! Realistic provider replies run through the public parser:
//! - Pretty-printed and compact blocks
//! - First marker wins when both syntaxes appear
//! - Malformed and unterminated blocks never leak into the dialogue

use interrogation_core::sidecar::{parse_reply, Sidecar, SidecarKind, SidecarParse};
use interrogation_core::StatusBlock;

#[test]
fn test_pretty_printed_status_block() {
    let raw = "\"I have nothing to hide.\"\n\n:::STATUS\n{\n  \"stress\": 37,\n  \"thought\": \"Keep the log sealed.\",\n  \"confession\": false\n}\n:::\n";
    let parsed = parse_reply(raw);

    assert_eq!(parsed.dialogue, "\"I have nothing to hide.\"");
    let sidecar = parsed.sidecar.sidecar().unwrap();
    assert_eq!(sidecar.kind(), SidecarKind::Status);
    assert_eq!(sidecar.stress(), Some(37));
    assert_eq!(sidecar.thought(), Some("Keep the log sealed."));
    assert!(!sidecar.confession());
}

#[test]
fn test_text_after_block_is_kept() {
    let raw = "Before.\n:::STATUS {\"stress\": 12} :::\nAfter.";
    let parsed = parse_reply(raw);
    assert_eq!(parsed.dialogue, "Before.\n\nAfter.");
    assert_eq!(parsed.sidecar.sidecar().unwrap().stress(), Some(12));
}

#[test]
fn test_fractional_and_out_of_range_stress() {
    let parsed = parse_reply("x\n:::STATUS\n{\"stress\": 41.6}\n:::");
    assert_eq!(parsed.sidecar.sidecar().unwrap().stress(), Some(42));

    let parsed = parse_reply("x\n:::STATUS\n{\"stress\": 250}\n:::");
    assert_eq!(parsed.sidecar.sidecar().unwrap().stress(), Some(100));
}

#[test]
fn test_first_marker_wins() {
    let raw = "Talk.\n:::SCHEMA\n{\"stress\": 20}\n:::\n:::STATUS\n{\"stress\": 90}\n:::";
    let parsed = parse_reply(raw);
    let sidecar = parsed.sidecar.sidecar().unwrap();
    assert_eq!(sidecar.kind(), SidecarKind::Schema);
    assert_eq!(sidecar.stress(), Some(20));
    assert!(!parsed.dialogue.contains(":::"));
}

#[test]
fn test_schema_payload_fields() {
    let raw = "Hm.\n:::SCHEMA\n{\"suggestions\": [\"Check the log\"], \"flags\": [\"nervous\"], \
\"branch\": {\"nodeId\": \"n1\"}, \"intercepted\": \"...\"}\n:::";
    let parsed = parse_reply(raw);
    match parsed.sidecar.sidecar().unwrap() {
        Sidecar::Schema(schema) => {
            assert_eq!(schema.suggestions, Some(vec!["Check the log".to_string()]));
            assert_eq!(schema.flags.len(), 1);
            assert_eq!(schema.branch_node(), Some(("n1", "n1")));
            assert_eq!(schema.intercepted.as_deref(), Some("..."));
        }
        other => panic!("expected schema, got {:?}", other),
    }
}

#[test]
fn test_malformed_json_is_stripped() {
    let parsed = parse_reply("Nope.\n:::STATUS\n{\"stress\": }\n:::");
    assert_eq!(parsed.dialogue, "Nope.");
    assert!(matches!(
        parsed.sidecar,
        SidecarParse::Malformed {
            kind: SidecarKind::Status,
            ..
        }
    ));
}

#[test]
fn test_unterminated_block_is_cut() {
    let parsed = parse_reply("Wait...\n:::STATUS\n{\"stress\": 50");
    assert_eq!(parsed.dialogue, "Wait...");
    assert!(parsed.sidecar.sidecar().is_none());
}

#[test]
fn test_no_block() {
    let parsed = parse_reply("  Just words.  ");
    assert_eq!(parsed.dialogue, "Just words.");
    assert_eq!(parsed.sidecar, SidecarParse::Absent);
}

#[test]
fn test_generated_status_block_parses_back() {
    let block = StatusBlock::new(64, "steady", true).to_block().unwrap();
    let parsed = parse_reply(&format!("Fine.\n\n{}", block));
    let sidecar = parsed.sidecar.sidecar().unwrap();
    assert_eq!(parsed.dialogue, "Fine.");
    assert_eq!(sidecar.stress(), Some(64));
    assert!(sidecar.confession());
}
