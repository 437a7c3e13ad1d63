//! Health chat broker: topic filter, LLM client with offline mock and
//! fallback, conversation logs.

pub mod filter;
pub mod llm;
pub mod prompts;
pub mod service;

pub use filter::is_health_related;
pub use llm::{ChatCompletion, ChatMessage, OpenAiClient};
pub use service::{context_for, ChatReply, ChatService};
