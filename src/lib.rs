pub mod config;
pub mod conversation;
pub mod driver;
pub mod error;
pub mod input;
pub mod providers;
pub mod transcript;

pub use config::{Config, ModelSpec};
pub use conversation::{Conversation, Role, Turn};
pub use driver::{Driver, NextTurn, StopReason};
pub use error::ArchpromptError;
pub use input::{LineSource, ScriptedInput, TerminalInput};
pub use providers::openai::OpenAiProvider;
pub use providers::{Completion, CompletionRequest, Provider, Usage};
pub use transcript::Transcript;
