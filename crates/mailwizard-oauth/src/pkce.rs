//! PKCE (RFC 7636) verifier/challenge pairs and random request state.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Challenge method sent with every authorization request.
pub const CHALLENGE_METHOD: &str = "S256";

/// PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    verifier: String,
    challenge: String,
}

impl PkceChallenge {
    /// Generates a fresh 43-character verifier and its challenge.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(random_token(32))
    }

    /// Builds the pair for a known verifier.
    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }

    /// Returns the verifier sent on code exchange.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Returns the challenge sent on authorization.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

/// Returns `len` random bytes encoded as unpadded URL-safe base64.
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
