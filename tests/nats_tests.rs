use glassbox::nats::TranscriptMessage;

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "a1b2c3",
        "text": "I would sort the array first",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id.as_deref(), Some("a1b2c3"));
    assert_eq!(msg.text, "I would sort the array first");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp.as_deref(), Some("2025-10-27T14:30:05Z"));
}

#[test]
fn test_transcript_minimal_message() {
    let msg: TranscriptMessage = serde_json::from_str(r#"{"text": "hello there"}"#).unwrap();

    assert!(msg.session_id.is_none());
    assert!(!msg.partial);
    assert!(msg.timestamp.is_none());
    assert!(msg.confidence.is_none());
}

#[test]
fn test_partial_results_are_skipped() {
    let msg: TranscriptMessage = serde_json::from_str(
        r#"{"session_id": "a1b2c3", "text": "This is a partial", "partial": true}"#,
    )
    .unwrap();

    assert!(!msg.is_for("a1b2c3"));
}

#[test]
fn test_session_routing() {
    let tagged: TranscriptMessage =
        serde_json::from_str(r#"{"session_id": "a1b2c3", "text": "use a stack"}"#).unwrap();
    assert!(tagged.is_for("a1b2c3"));
    assert!(!tagged.is_for("other"));

    // Untagged speech belongs to whichever session is running
    let untagged: TranscriptMessage =
        serde_json::from_str(r#"{"text": "use a stack"}"#).unwrap();
    assert!(untagged.is_for("a1b2c3"));
}

#[test]
fn test_blank_text_is_skipped() {
    let msg: TranscriptMessage = serde_json::from_str(r#"{"text": "   "}"#).unwrap();
    assert!(!msg.is_for("a1b2c3"));
}
