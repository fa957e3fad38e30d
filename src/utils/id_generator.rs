use rand::{rng, Rng};

/// Characters a short code may contain: A-Z, a-z, 0-9
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default number of characters in a generated short code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Draws a short code of `length` characters, each chosen uniformly and
/// independently from [`ALPHABET`].
pub fn generate_short_id(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `candidate` could have come from [`generate_short_id`]
pub fn is_short_code(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|b| ALPHABET.contains(&b))
}
