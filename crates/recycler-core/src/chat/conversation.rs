//! Chat transcript with a one-send-at-a-time guard.
//!
//! Sending is split in two so the transcript can live behind a lock while
//! the model call runs without it: `begin_send` records the user message
//! and marks the conversation busy, `finish_send` appends the reply.

use std::time::Duration;
use tracing::{debug, warn};

use super::{get_reply, ChatBackend, Persona};
use crate::types::*;

#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Persona,
    transcript: Vec<ChatMessage>,
    pending: bool,
}

/// A send that has been recorded but not answered yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub persona: Persona,
    pub message: String,
}

impl Conversation {
    /// Fresh conversation, opened with the persona's greeting if it has one
    pub fn new(persona: Persona) -> Self {
        let transcript = persona
            .greeting
            .iter()
            .map(|g| ChatMessage::assistant(g.clone()))
            .collect();

        Self { persona, transcript, pending: false }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// True while a reply is outstanding ("typing" indicator)
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record the user message. Blank input is ignored (`Ok(None)`).
    pub fn begin_send(&mut self, input: &str) -> ShopResult<Option<PendingReply>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        if self.pending {
            return Err(ShopError::AlreadyInProgress(format!(
                "{} is still answering",
                self.persona.name
            )));
        }

        self.transcript.push(ChatMessage::user(input));
        self.pending = true;

        Ok(Some(PendingReply {
            persona: self.persona.clone(),
            message: input.to_string(),
        }))
    }

    /// Append the assistant reply and clear the busy flag
    pub fn finish_send(&mut self, reply: String) {
        debug!("{} replied ({} chars)", self.persona.name, reply.len());
        self.transcript.push(ChatMessage::assistant(reply));
        self.pending = false;
    }

    /// Give up on the outstanding reply: clear the busy flag and show the
    /// persona's fallback in its place. No-op when nothing is pending.
    pub fn abandon_send(&mut self) {
        if !self.pending {
            return;
        }
        warn!("{} reply abandoned", self.persona.name);
        self.transcript.push(ChatMessage::assistant(self.persona.fallback.clone()));
        self.pending = false;
    }

    /// Full round trip. Returns the reply appended, or `None` for blank input.
    pub async fn send(
        &mut self,
        backend: &dyn ChatBackend,
        input: &str,
        timeout: Duration,
    ) -> ShopResult<Option<String>> {
        let Some(pending) = self.begin_send(input)? else {
            return Ok(None);
        };

        let mut guard = SendGuard { conversation: self, settled: false };
        let reply = get_reply(backend, &pending.persona, &pending.message, timeout).await;
        guard.settled = true;
        guard.conversation.finish_send(reply.clone());
        Ok(Some(reply))
    }
}

/// Abandons the send if the `send` future is dropped mid-call
struct SendGuard<'a> {
    conversation: &'a mut Conversation,
    settled: bool,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.conversation.abandon_send();
        }
    }
}
