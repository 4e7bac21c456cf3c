use crate::oauth_provider::constants::HANDLE_BYTES_LENGTH;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A fresh opaque handle: the prefix followed by hex encoded random bytes.
pub fn generate_handle(prefix: &str) -> String {
    let mut bytes = [0u8; HANDLE_BYTES_LENGTH];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{prefix}{}", hex::encode(bytes))
}

pub fn is_handle(prefix: &str, value: &str) -> bool {
    value.len() == prefix.len() + HANDLE_BYTES_LENGTH * 2
        && value.starts_with(prefix)
        && value[prefix.len()..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Store key for a handle. Raw handles are never persisted.
pub fn hash_key(value: &str, grant_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.update(b":");
    hasher.update(grant_type.as_bytes());
    hex::encode(hasher.finalize())
}
