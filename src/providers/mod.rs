pub mod openai;

use async_trait::async_trait;

use crate::conversation::Turn;
use crate::error::ArchpromptError;

/// Everything one completion call needs: the model, the full ordered history,
/// and the sampling parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub turns: &'a [Turn],
    pub max_tokens: u32,
    pub temperature: f64,
    /// Ask the backend for a single JSON object reply.
    pub json_object: bool,
}

/// Token accounting reported by the backend, when it reports any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A single assistant turn plus optional usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub turn: Turn,
    pub usage: Option<Usage>,
}

/// Extension point for LLM inference backends. The driver only ever holds a
/// `&dyn Provider`.
///
/// Implementations return `RemoteCallFailed` for every transport, status, or
/// response-shape failure and never retry.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest<'_>)
        -> Result<Completion, ArchpromptError>;
}
