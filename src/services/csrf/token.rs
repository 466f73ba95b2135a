use axum::http::HeaderName;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Anti-forgery token bound to a session.
///
/// `header_name` is the response header used to hand the token back to the
/// client; the client echoes it under the same name on state-changing requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityToken {
    pub value: String,
    pub header_name: String,
}

impl SecurityToken {
    pub fn new(value: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            header_name: header_name.into(),
        }
    }
}

// The value is a secret; keep it out of logs.
impl std::fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityToken")
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    #[error("random source failure: {0}")]
    Rng(getrandom::Error),
}

/// How tokens are minted and checked.
#[derive(Debug, Clone)]
pub struct CsrfPolicy {
    pub header_name: HeaderName,
    // When false, state-changing requests are not checked (tokens are still propagated).
    pub enforce: bool,
}

impl CsrfPolicy {
    pub fn new(header_name: HeaderName, enforce: bool) -> Self {
        Self {
            header_name,
            enforce,
        }
    }

    /// Mint a fresh candidate token: 32 bytes of OS entropy, URL-safe base64.
    pub fn generate(&self) -> Result<SecurityToken, CsrfError> {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes).map_err(CsrfError::Rng)?;

        Ok(SecurityToken::new(
            URL_SAFE_NO_PAD.encode(bytes),
            self.header_name.as_str(),
        ))
    }
}
