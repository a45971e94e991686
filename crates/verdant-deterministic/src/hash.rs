/// Length of a stable hash in lowercase hex characters.
pub const HASH_HEX_LEN: usize = 64;

/// Separator used by the generation-hash contract.
const GENERATION_HASH_SEPARATOR: char = '|';

/// Fixed-length digest of a UTF-8 string: blake3, 64 lowercase hex chars.
pub fn stable_hash(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// The generation-hash contract: canonical payload, version string, and seed
/// string joined with a literal `|` in this exact order, then hashed.
pub fn generation_hash(canonical_payload: &str, version: &str, seed: &str) -> String {
    stable_hash(&format!(
        "{canonical_payload}{sep}{version}{sep}{seed}",
        sep = GENERATION_HASH_SEPARATOR
    ))
}

/// Recomputes the generation hash and compares it to a declared one.
pub fn verify_generation_hash(
    canonical_payload: &str,
    version: &str,
    seed: &str,
    declared: &str,
) -> bool {
    generation_hash(canonical_payload, version, seed) == declared
}

/// True when the string has the exact shape of a stable hash.
pub fn is_stable_hash(candidate: &str) -> bool {
    candidate.len() == HASH_HEX_LEN
        && candidate
            .bytes()
            .all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = stable_hash("payload");
        assert_eq!(digest.len(), HASH_HEX_LEN);
        assert!(is_stable_hash(&digest));
    }

    #[test]
    fn identical_input_identical_digest() {
        assert_eq!(stable_hash("abc"), stable_hash("abc"));
        assert_ne!(stable_hash("abc"), stable_hash("abd"));
    }

    #[test]
    fn generation_hash_uses_pipe_separated_fields() {
        let direct = stable_hash("{\"a\":1}|v2.1.0|12345");
        assert_eq!(generation_hash("{\"a\":1}", "v2.1.0", "12345"), direct);
    }

    #[test]
    fn verification_detects_field_tampering() {
        let declared = generation_hash("{\"a\":1}", "v1", "7");
        assert!(verify_generation_hash("{\"a\":1}", "v1", "7", &declared));
        assert!(!verify_generation_hash("{\"a\":2}", "v1", "7", &declared));
        assert!(!verify_generation_hash("{\"a\":1}", "v2", "7", &declared));
        assert!(!verify_generation_hash("{\"a\":1}", "v1", "8", &declared));
    }

    #[test]
    fn hash_shape_check_rejects_malformed_values() {
        assert!(!is_stable_hash("short"));
        assert!(!is_stable_hash(&"A".repeat(64)));
        assert!(!is_stable_hash(&"g".repeat(64)));
        assert!(is_stable_hash(&"0".repeat(64)));
    }
}
