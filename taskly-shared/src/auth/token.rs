/// Bearer token utilities
///
/// Generation, hashing and format checks for the opaque tokens handed out at
/// login and registration. These work with `models::access_token`, which
/// persists the hash and binds it to a user.
///
/// # Security
///
/// - **Format**: `tkly_{40_chars}` (prefix + 40 random base62 chars)
/// - **Storage**: only the SHA-256 hex digest is persisted
/// - **Comparison**: constant-time, never short-circuiting on the first mismatch
///
/// # Example
///
/// ```
/// use taskly_shared::auth::token::{generate_token, hash_token, validate_token_format};
///
/// let (token, hash) = generate_token();
/// assert!(token.starts_with("tkly_"));
/// assert!(validate_token_format(&token));
/// assert_eq!(hash, hash_token(&token));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random part of a token (characters)
const TOKEN_RANDOM_LENGTH: usize = 40;

/// Token prefix
pub const TOKEN_PREFIX: &str = "tkly_";

/// Total length of a token (prefix + random)
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Generates a new bearer token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_hash)
pub fn generate_token() -> (String, String) {
    let token = format!("{}{}", TOKEN_PREFIX, generate_random_string(TOKEN_RANDOM_LENGTH));
    let hash = hash_token(&token);

    (token, hash)
}

/// Generates a random base62 string
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hashes a token with SHA-256
///
/// # Returns
///
/// Hex-encoded digest (64 characters)
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validates token format
///
/// A well-formed token has the `tkly_` prefix followed by exactly 40 ASCII
/// alphanumeric characters. Anything else is rejected before touching the
/// database.
///
/// # Example
///
/// ```
/// use taskly_shared::auth::token::validate_token_format;
///
/// assert!(validate_token_format("tkly_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMN"));
/// assert!(!validate_token_format("tkly_short"));
/// assert!(!validate_token_format("Bearer tkly_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMN"));
/// ```
pub fn validate_token_format(token: &str) -> bool {
    if token.len() != TOKEN_LENGTH {
        return false;
    }

    match token.strip_prefix(TOKEN_PREFIX) {
        Some(random_part) => random_part.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Verifies a plaintext token against a stored hash
pub fn verify_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_token(token), stored_hash)
}

/// Constant-time string comparison
///
/// Always walks the full length of both inputs once lengths match.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
