use anyhow::Result;

use super::Message;
use super::MessagePart;
use super::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::User, "Hi there!");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.role.to_string(), "user");
    assert_eq!(msg.text(), "Hi there!");
    assert_eq!(msg.parts.len(), 1);
    assert!(!msg.id.is_empty());
}

#[test]
fn it_generates_unique_ids() {
    let first = Message::new(Role::User, "a");
    let second = Message::new(Role::User, "a");
    assert_ne!(first.id, second.id);
}

#[test]
fn it_executes_append() {
    let mut msg = Message::new(Role::Assistant, "Hi");
    msg.append(" there");
    assert_eq!(msg.parts.len(), 1);
    assert_eq!(msg.text(), "Hi there");
}

#[test]
fn it_appends_to_empty_message() {
    let mut msg = Message::empty("msg-1", Role::Assistant);
    msg.append("Hi");
    assert_eq!(msg.id, "msg-1");
    assert_eq!(msg.parts.len(), 1);
    assert_eq!(msg.text(), "Hi");
}

#[test]
fn it_joins_text_parts_and_skips_others() {
    let msg = Message {
        id: "msg-1".to_string(),
        role: Role::Assistant,
        parts: vec![
            MessagePart::Text {
                text: "Hi".to_string(),
            },
            MessagePart::Other,
            MessagePart::Text {
                text: " there".to_string(),
            },
        ],
    };

    assert_eq!(msg.text(), "Hi there");
}

#[test]
fn it_serializes_like_the_browser_client() -> Result<()> {
    let msg = Message {
        id: "msg-1".to_string(),
        role: Role::User,
        parts: vec![MessagePart::Text {
            text: "Hello".to_string(),
        }],
    };

    insta::assert_snapshot!(serde_json::to_string(&msg)?, @r###"{"id":"msg-1","role":"user","parts":[{"type":"text","text":"Hello"}]}"###);

    return Ok(());
}

#[test]
fn it_deserializes_unknown_parts() -> Result<()> {
    let msg: Message = serde_json::from_str(
        r#"{"id":"a","role":"assistant","parts":[{"type":"step-start"},{"type":"text","text":"Hi","state":"done"}]}"#,
    )?;

    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.parts[0], MessagePart::Other);
    assert_eq!(msg.text(), "Hi");

    return Ok(());
}
