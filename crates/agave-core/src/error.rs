// ── Core error types ──
//
// Failures while turning one inbound request into a published event.
// None of them affect the writer or the seen-IP cache.

use thiserror::Error;

use agave_feed::WriteError;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Event construction ───────────────────────────────────────────
    #[error("Malformed remote address '{addr}': {reason}")]
    MalformedAddress { addr: String, reason: String },

    #[error("Failed to read request body: {0}")]
    Body(#[from] std::io::Error),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Publishing ───────────────────────────────────────────────────
    /// The event was built; publishing it was degraded or impossible.
    /// Check [`WriteError::queued`] to see whether it is still on its way.
    #[error(transparent)]
    Publish(#[from] WriteError),
}

impl CoreError {
    /// `true` if the event was queued for publishing despite the error.
    pub fn was_queued(&self) -> bool {
        matches!(self, Self::Publish(WriteError::Degraded { .. }))
    }
}
