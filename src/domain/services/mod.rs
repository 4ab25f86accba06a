pub mod actions;
mod chat_session;
mod stream_encoder;

pub use chat_session::*;
pub use stream_encoder::*;
