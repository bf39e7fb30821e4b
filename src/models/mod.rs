pub mod chat;

pub use chat::{ ChatReply, ChatRequest, ErrorBody, Message, Role };
