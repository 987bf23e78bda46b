//! ============================================================================
//! Chat Module - Generative AI Collaborator
//! ============================================================================
//! Persona-driven replies for the storefront's three chat surfaces:
//! - Persona: system prompt, temperature and fallback texts
//! - GeminiClient: generateContent over HTTPS
//! - Conversation: transcript with a single-send guard
//!
//! Every call is bounded by a timeout and never retried. Failures collapse
//! into the persona's fallback text instead of surfacing as errors.
//! ============================================================================

mod conversation;
mod gemini;
mod persona;

pub use conversation::{Conversation, PendingReply};
pub use gemini::GeminiClient;
pub use persona::Persona;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{ShopError, ShopResult};

/// A generative model that can answer as a persona
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Raw model text; may be empty
    async fn reply(&self, persona: &Persona, message: &str) -> Result<String>;
}

/// One bounded call. Empty model output is replaced with the persona's
/// empty-reply text; errors and timeouts become `ExternalCallFailure`.
pub async fn try_get_reply(
    backend: &dyn ChatBackend,
    persona: &Persona,
    message: &str,
    timeout: Duration,
) -> ShopResult<String> {
    debug!("Asking {} ({} chars)", persona.name, message.len());

    match tokio::time::timeout(timeout, backend.reply(persona, message)).await {
        Ok(Ok(text)) if text.trim().is_empty() => Ok(persona.empty_reply.clone()),
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ShopError::ExternalCallFailure(e.to_string())),
        Err(_) => Err(ShopError::ExternalCallFailure(format!(
            "no reply within {:?}",
            timeout
        ))),
    }
}

/// Like `try_get_reply`, but always yields displayable text
pub async fn get_reply(
    backend: &dyn ChatBackend,
    persona: &Persona,
    message: &str,
    timeout: Duration,
) -> String {
    match try_get_reply(backend, persona, message, timeout).await {
        Ok(text) => text,
        Err(e) => {
            warn!("{} chat failed: {}", persona.name, e);
            persona.fallback.clone()
        }
    }
}
