use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Invalid verification token")]
    InvalidToken,
}

/// Subscription handshake: echo the challenge back when the submitted token
/// matches the configured one. An absent challenge echoes as empty.
pub fn verify(
    submitted_token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Result<String, VerifyError> {
    match submitted_token {
        Some(token) if token == expected_token => Ok(challenge.unwrap_or_default().to_string()),
        _ => Err(VerifyError::InvalidToken),
    }
}
