use thiserror::Error;

/// Boxed error from an external collaborator (validation service, RPC).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a check-resolution attempt did not produce a message to send.
///
/// Every variant ends the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    // ── Operator ─────────────────────────────────────────────────────────────
    /// The operator declined a prompt or tore down the fee editor.
    #[error("aborted by user")]
    AbortedByUser,

    // ── Checks ───────────────────────────────────────────────────────────────
    #[error("message checks failed")]
    CheckFailed,

    // ── Collaborators ────────────────────────────────────────────────────────
    #[error("validation service unavailable: {0}")]
    ValidationUnavailable(#[source] BoxError),

    #[error("fee editor session failed: {0}")]
    EditorSession(#[source] std::io::Error),

    #[error("writing to operator: {0}")]
    Output(#[from] std::io::Error),
}

impl ResolveError {
    /// Operator cancellations are not faults and are reported without
    /// error decoration.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, ResolveError::AbortedByUser)
    }
}
