//! Hawk session credentials
//!
//! The service hands back a `hawk-session-token` header on registration. The
//! token is hex; HKDF splits it into a token id (used as the Hawk `id`) and
//! an auth key (used as the Hawk MAC key), both re-encoded as hex.

pub mod hawk;
pub mod hkdf;

use anyhow::{ensure, Context, Result};

/// Derived credentials for signing requests within one registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HawkCredentials {
    /// Token id, hex. Sent in the clear inside the Authorization header.
    pub id: String,
    /// Auth key, hex. The HMAC key is the hex string's ASCII bytes, not the
    /// decoded bytes; the server's verifier does the same.
    pub key: String,
}

impl HawkCredentials {
    /// Derive credentials from the session token returned at registration.
    pub fn from_session_token(session_token: &str) -> Result<Self> {
        let ikm = hex::decode(session_token.trim())
            .context("hawk-session-token is not valid hex")?;
        ensure!(
            ikm.len() == 32,
            "hawk-session-token must be 32 bytes, got {}",
            ikm.len()
        );

        let material = hkdf::derive(&ikm, &hkdf::kw("sessionToken"), &[], 64);
        Ok(Self {
            id: hex::encode(&material[..32]),
            key: hex::encode(&material[32..64]),
        })
    }
}
