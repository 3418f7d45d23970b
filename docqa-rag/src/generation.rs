//! Generation capability: instruction, history, context and question in,
//! answer text out.

use async_trait::async_trait;

use crate::conversation::ConversationTurn;
use crate::error::Result;

/// Everything a provider needs to produce one grounded answer.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Fixed system instruction constraining the answer to the context.
    pub instruction: &'a str,
    /// Prior turns, oldest first.
    pub history: &'a [ConversationTurn],
    /// Retrieved document text the answer must be grounded in.
    pub context: &'a str,
    /// The question being asked.
    pub query: &'a str,
}

impl GenerationRequest<'_> {
    /// The instruction and the context combined into one system prompt.
    pub fn system_prompt(&self) -> String {
        format!("{}\n\nContext:\n{}", self.instruction, self.context)
    }
}

/// A completion backend (OpenAI, a local model, a test double).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{GenerationProvider, GenerationRequest};
///
/// let answer = provider
///     .generate(&GenerationRequest { instruction, history: &history, context, query })
///     .await?;
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce the answer text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationError`](crate::RagError::GenerationError)
    /// if the backend fails or times out.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}
