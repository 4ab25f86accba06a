mod action;
mod chat_model;
mod chat_request;
mod chat_status;
mod event;
mod message;
mod provider;
mod slash_commands;
mod transport;
mod ui_message_chunk;

pub use action::*;
pub use chat_model::*;
pub use chat_request::*;
pub use chat_status::*;
pub use event::*;
pub use message::*;
pub use provider::*;
pub use slash_commands::*;
pub use transport::*;
pub use ui_message_chunk::*;
