use super::ChatRequest;

pub enum Action {
    SendRequest(u64, ChatRequest),
    Abort(),
}
