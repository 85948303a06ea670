use thiserror::Error;

/// Identity-exchange failures.
///
/// Never retried automatically; the chat layer surfaces these as the generic
/// recognition-failure message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to sign token claims: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("identity service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity service returned {status}: {body}")]
    Exchange { status: u16, body: String },
}
