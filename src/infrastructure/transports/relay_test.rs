use anyhow::Result;
use test_utils::sse_body;
use test_utils::ui_message_stream_fixture;
use tokio::sync::mpsc;

use super::RelayTransport;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::Transport;
use crate::domain::models::UIMessageChunk;

fn request() -> ChatRequest {
    return ChatRequest {
        messages: vec![Message::new(Role::User, "Hello")],
        model: Some("google/gemini-1.5-flash".to_string()),
    };
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = vec![];
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    return events;
}

#[tokio::test]
async fn it_forwards_stream_chunks() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"model":"google/gemini-1.5-flash"}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_header("x-vercel-ai-ui-message-stream", "v1")
        .with_body(ui_message_stream_fixture())
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    RelayTransport::new(&server.url())
        .send(3, request(), &tx)
        .await?;

    mock.assert_async().await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 8);
    assert_eq!(
        events[0],
        Event::StreamChunk(
            3,
            UIMessageChunk::Start {
                message_id: Some("msg-1".to_string())
            }
        )
    );

    let text = events
        .iter()
        .filter_map(|event| {
            if let Event::StreamChunk(_, UIMessageChunk::TextDelta { delta, .. }) = event {
                return Some(delta.to_string());
            }
            return None;
        })
        .collect::<String>();
    assert_eq!(text, "Hi there");
    assert_eq!(events[7], Event::StreamChunk(3, UIMessageChunk::Finish));

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_rejected_requests() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(502)
        .with_body("provider unavailable")
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let res = RelayTransport::new(&server.url())
        .send(1, request(), &tx)
        .await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Relay rejected chat request, 502");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn it_fails_when_the_stream_is_cut_short() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(sse_body(&[
            r#"{"type":"start","messageId":"msg-1"}"#,
            r#"{"type":"text-delta","id":"0","delta":"Hi"}"#,
        ]))
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let res = RelayTransport::new(&server.url())
        .send(1, request(), &tx)
        .await;

    assert!(res.is_err());
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn it_accepts_an_error_chunk_as_the_end_of_the_stream() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(sse_body(&[
            r#"{"type":"start"}"#,
            r#"{"type":"error","errorText":"boom"}"#,
        ]))
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    RelayTransport::new(&server.url())
        .send(1, request(), &tx)
        .await?;

    let events = drain(&mut rx);
    assert_eq!(
        events[1],
        Event::StreamChunk(
            1,
            UIMessageChunk::Error {
                error_text: "boom".to_string()
            }
        )
    );

    return Ok(());
}
