//! 记忆层：消息模型与单次协作的对话记录

pub mod conversation;
pub mod transcript;

pub use conversation::{Message, Role};
pub use transcript::{Speaker, Transcript, Turn};
