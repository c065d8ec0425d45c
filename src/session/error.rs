use crate::session::store::StoreError;
use thiserror::Error;

/// Failure taxonomy for session and API operations.
///
/// `SessionExpired` and `VerificationRequired` are also handled centrally by
/// the authority (session mutation, notification, redirect) before they reach
/// the caller; the caller only needs to abort its own rendering.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token present locally; raised before any network I/O.
    #[error("no authentication token present")]
    Unauthenticated,
    /// Transport failure before any response. Carries the user-facing message.
    #[error("network failure: {0}")]
    Network(String),
    /// The server answered 401; the session has already been cleared.
    #[error("session expired")]
    SessionExpired,
    /// The server answered 403 with `requiresVerification`; the session is
    /// intact, only flagged.
    #[error("account verification required")]
    VerificationRequired { email: Option<String> },
    /// Malformed local input, rejected before the network.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Any other non-2xx, with the message the server supplied.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
