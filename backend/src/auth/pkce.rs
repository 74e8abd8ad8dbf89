//! PKCE verifier/challenge pair for the OAuth handoff

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Verifier kept in a cookie, challenge sent to the provider
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate PKCE verifier")?;
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }
}

/// S256 challenge: base64url(sha256(verifier)) without padding
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_known_value() {
        assert_eq!(
            challenge_for("fitness-assistant-pkce-verifier"),
            "8iD8OHOziLVO-Xuzs1Ek8l8FzPtuS7OwZM08HP8sEPY"
        );
    }

    #[test]
    fn test_generate_shape() {
        let pair = PkcePair::generate().unwrap();
        // 32 bytes of base64url without padding
        assert_eq!(pair.verifier.len(), 43);
        assert_eq!(pair.challenge, challenge_for(&pair.verifier));
        assert!(!pair.verifier.contains('='));
    }

    #[test]
    fn test_generate_is_random() {
        let a = PkcePair::generate().unwrap();
        let b = PkcePair::generate().unwrap();
        assert_ne!(a.verifier, b.verifier);
    }
}
