use super::UIMessageChunk;

/// Stream progress, tagged with the generation of the request it belongs to.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    StreamChunk(u64, UIMessageChunk),
    StreamFailed(u64, String),
}
