//! Random value generation for tokens and admin secrets
//!
//! Token nonces are opaque, URL-safe strings with at least 128 bits of
//! entropy. Admin secrets are short human-readable words so that an operator
//! can read one over the phone; they authenticate nothing on their own and
//! are rotated on demand.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{Rng, TryRngCore, rngs::OsRng};

/// Generate an opaque token nonce with at least 128 bits of entropy
///
/// The nonce is base64 URL-safe encoded without padding, so it can be embedded
/// directly into confirmation and reset links.
pub fn generate_nonce() -> String {
    // 16 bytes = 128 bits of random data
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes).unwrap();

    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Word list for human-readable admin secrets.
const SECRET_WORDS: &[&str] = &[
    "anchor", "aspen", "badger", "bamboo", "basalt", "beacon", "birch", "bison", "breeze",
    "canyon", "cedar", "cinder", "cobalt", "comet", "coral", "cricket", "dahlia", "delta",
    "ember", "falcon", "fjord", "garnet", "glacier", "harbor", "hazel", "heron", "juniper",
    "krill", "lagoon", "lantern", "linden", "magma", "maple", "meadow", "mesa", "nimbus",
    "obsidian", "onyx", "orchid", "osprey", "pebble", "pinion", "quartz", "raven", "reef",
    "sequoia", "sparrow", "summit", "talon", "thistle", "timber", "tundra", "walnut", "willow",
    "yarrow", "zephyr",
];

/// Generate a fresh human-readable admin secret.
pub fn generate_secret() -> String {
    let index = rand::rng().random_range(0..SECRET_WORDS.len());
    SECRET_WORDS[index].to_string()
}

/// Generate a new admin secret that is guaranteed to differ from the current one.
pub fn rotate_secret(current: &str) -> String {
    loop {
        let candidate = generate_secret();
        if candidate != current {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_nonce_is_unique() {
        let nonce = generate_nonce();
        let nonce2 = generate_nonce();
        assert_ne!(nonce, nonce2);

        let decoded = BASE64_URL_SAFE_NO_PAD.decode(&nonce).unwrap();
        assert_eq!(decoded.len(), 16);
    }

    #[test]
    fn test_nonce_is_url_safe() {
        let nonce = generate_nonce();
        assert!(
            nonce
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        );
    }

    #[test]
    fn test_generate_secret_is_a_known_word() {
        let secret = generate_secret();
        assert!(SECRET_WORDS.contains(&secret.as_str()));
    }

    #[test]
    fn test_rotate_secret_always_changes() {
        for _ in 0..50 {
            let current = generate_secret();
            let next = rotate_secret(&current);
            assert_ne!(current, next);
        }
    }
}
