use rand::RngCore;

/// 20 bytes = 160 bits of entropy, rendered as 40 lowercase hex characters.
pub const TOKEN_BYTES: usize = 20;

/// Fresh opaque bearer key from a cryptographically secure generator.
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_is_40_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), TOKEN_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn no_collisions_across_10k_keys() {
        let keys: HashSet<String> = (0..10_000).map(|_| generate_token_key()).collect();
        assert_eq!(keys.len(), 10_000);
    }
}
