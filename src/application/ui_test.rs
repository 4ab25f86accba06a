use super::Console;
use crate::domain::models::Action;
use crate::domain::models::ChatStatus;
use crate::domain::models::Event;
use crate::domain::models::UIMessageChunk;

fn delta(text: &str) -> UIMessageChunk {
    return UIMessageChunk::TextDelta {
        id: "0".to_string(),
        delta: text.to_string(),
    };
}

fn submit(console: &mut Console, text: &str) -> u64 {
    let mut out = "".to_string();
    match console.on_line(text, &mut out) {
        Some(Action::SendRequest(generation, _)) => return generation,
        _ => panic!("expected a request for {text}"),
    }
}

#[test]
fn it_prints_deltas_as_they_arrive() {
    let mut console = Console::new("google/gemini-1.5-flash");
    let generation = submit(&mut console, "Hello");

    let mut out = "".to_string();
    console.on_event(
        Event::StreamChunk(
            generation,
            UIMessageChunk::Start {
                message_id: Some("msg-1".to_string()),
            },
        ),
        &mut out,
    );
    console.on_event(Event::StreamChunk(generation, delta("Hi")), &mut out);
    assert!(out.contains("Assistant:"));
    assert!(out.ends_with("Hi"));

    let mut out = "".to_string();
    console.on_event(Event::StreamChunk(generation, delta(" there")), &mut out);
    assert_eq!(out, " there");

    let mut out = "".to_string();
    console.on_event(Event::StreamChunk(generation, UIMessageChunk::Finish), &mut out);
    assert_eq!(out, "\n> ");
    assert_eq!(console.session.status, ChatStatus::Idle);
}

#[test]
fn it_prints_the_generic_error_on_failure() {
    let mut console = Console::new("google/gemini-1.5-flash");
    let generation = submit(&mut console, "Hello");

    let mut out = "".to_string();
    console.on_event(
        Event::StreamFailed(generation, "Relay rejected chat request, 502".to_string()),
        &mut out,
    );

    assert!(out.contains("Something went wrong. Please check your API key."));
    assert!(out.contains("/retry"));
    assert!(!out.contains("502"));
    assert_eq!(console.session.input(), "Hello");
}

#[test]
fn it_shows_the_kept_input_after_a_failure() {
    let mut console = Console::new("google/gemini-1.5-flash");
    let generation = submit(&mut console, "Tell me a joke");

    let mut out = "".to_string();
    console.on_event(Event::StreamFailed(generation, "boom".to_string()), &mut out);

    assert!(out.contains("Your message was kept:"));
    assert!(out.contains("Tell me a joke"));
    assert!(out.ends_with("Type /retry to send it again.\n> "));
}

#[test]
fn it_retries_after_an_error() {
    let mut console = Console::new("google/gemini-1.5-flash");
    let generation = submit(&mut console, "Hello");

    let mut out = "".to_string();
    console.on_event(Event::StreamFailed(generation, "boom".to_string()), &mut out);

    let mut out = "".to_string();
    match console.on_line("/retry", &mut out) {
        Some(Action::SendRequest(next, request)) => {
            assert!(next > generation);
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.messages[0].text(), "Hello");
        }
        _ => panic!("expected a retry request"),
    }
    assert_eq!(console.session.status, ChatStatus::Submitted);
}

#[test]
fn it_rejects_input_while_answering() {
    let mut console = Console::new("google/gemini-1.5-flash");
    submit(&mut console, "Hello");

    let mut out = "".to_string();
    assert!(console.on_line("Another one", &mut out).is_none());
    assert!(out.contains("Still answering"));
    assert_eq!(console.session.messages.len(), 1);
}

#[test]
fn it_stops_on_interrupt_then_quits_when_idle() {
    let mut console = Console::new("google/gemini-1.5-flash");
    let generation = submit(&mut console, "Hello");

    let mut out = "".to_string();
    console.on_event(Event::StreamChunk(generation, delta("Hi")), &mut out);

    let mut out = "".to_string();
    assert!(matches!(
        console.on_interrupt(&mut out),
        Some(Action::Abort())
    ));
    assert!(out.contains("[stopped]"));
    assert!(!console.should_quit());

    let mut out = "".to_string();
    console.on_event(Event::StreamChunk(generation, delta(" late")), &mut out);
    assert_eq!(out, "");
    assert_eq!(console.session.messages[1].text(), "Hi");

    let mut out = "".to_string();
    assert!(console.on_interrupt(&mut out).is_none());
    assert!(console.should_quit());
}

#[test]
fn it_selects_models_by_index() {
    let mut console = Console::new("google/gemini-1.5-flash");

    let mut out = "".to_string();
    assert!(console.on_line("/model 4", &mut out).is_none());
    assert_eq!(console.session.model(), "openai/gpt-4o");
    assert!(out.contains("GPT-4o"));

    let mut out = "".to_string();
    console.on_line("/model nope", &mut out);
    assert!(out.contains("Unknown model nope"));
    assert_eq!(console.session.model(), "openai/gpt-4o");

    let mut out = "".to_string();
    console.on_line("/models", &mut out);
    assert!(out.contains("* 4. GPT-4o (openai/gpt-4o)"));
}

#[test]
fn it_quits_on_slash_quit() {
    let mut console = Console::new("google/gemini-1.5-flash");

    let mut out = "".to_string();
    assert!(console.on_line("/quit", &mut out).is_none());
    assert!(console.should_quit());
}
