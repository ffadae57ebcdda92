pub mod chat;
pub mod types;

pub use chat::{ChatClient, CHAT_COMPLETIONS_PATH};
pub use types::{
    ChatRequest, ChatResponseEnvelope, Choice, ChoiceMessage, JsonSchemaSpec, Message,
    ResponseFormatKind, ResponseFormatSpec, Role,
};
