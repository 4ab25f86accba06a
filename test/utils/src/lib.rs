/// Builds a server-sent events body out of raw `data:` payloads, the same
/// framing both the relay and the OpenAI compatible providers use.
pub fn sse_body(payloads: &[&str]) -> String {
    return payloads
        .iter()
        .map(|payload| {
            return format!("data: {payload}\n\n");
        })
        .collect::<Vec<String>>()
        .join("");
}

pub fn ui_message_stream_fixture() -> String {
    return sse_body(&[
        r#"{"type":"start","messageId":"msg-1"}"#,
        r#"{"type":"start-step"}"#,
        r#"{"type":"text-start","id":"0"}"#,
        r#"{"type":"text-delta","id":"0","delta":"Hi"}"#,
        r#"{"type":"text-delta","id":"0","delta":" there"}"#,
        r#"{"type":"text-end","id":"0"}"#,
        r#"{"type":"finish-step"}"#,
        r#"{"type":"finish"}"#,
        "[DONE]",
    ]);
}

pub fn openai_stream_fixture() -> String {
    return sse_body(&[
        r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
        r#"{"choices":[{"delta":{"content":"Hi"}}]}"#,
        r#"{"choices":[{"delta":{"content":" there"}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "[DONE]",
    ]);
}

pub fn gemini_stream_fixture() -> String {
    return sse_body(&[
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi"}]}}]}"#,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":" there"}]},"finishReason":"STOP"}]}"#,
    ]);
}
