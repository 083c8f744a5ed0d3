//! Agent API key generation and hashing.
//!
//! Keys are shown to the agent once at registration. Only the SHA-256 hash
//! and a short display prefix are ever stored.

use rand::Rng;
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Every key starts with this marker so leaked keys are easy to grep for.
pub const KEY_MARKER: &str = "clwdbar_";

/// Number of random alphanumeric characters after the marker.
pub const KEY_RANDOM_LENGTH: usize = 32;

/// Number of leading characters stored as a human-visible prefix.
pub const KEY_PREFIX_LENGTH: usize = 12;

/// Header agents send their key in.
pub const API_KEY_HEADER: &str = "x-agent-key";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The result of generating a new API key.
pub struct GeneratedApiKey {
    /// The plaintext key (shown to the agent exactly once, never stored).
    pub plaintext: String,
    /// The first [`KEY_PREFIX_LENGTH`] characters of the key for display.
    pub prefix: String,
    /// The SHA-256 hex digest of the plaintext key (stored in the database).
    pub hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let random: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();
    let plaintext = format!("{KEY_MARKER}{random}");

    GeneratedApiKey {
        prefix: extract_prefix(&plaintext).to_string(),
        hash: hash_api_key(&plaintext),
        plaintext,
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Compute the SHA-256 hex digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Extract the display prefix from a plaintext API key.
pub fn extract_prefix(key: &str) -> &str {
    match key.char_indices().nth(KEY_PREFIX_LENGTH) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
