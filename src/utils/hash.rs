//! Hashing helpers for content-addressed names.
//!
//! Uses blake3 everywhere a value leaves the process (target file names,
//! cache keys, content signatures) so that independent processes agree on
//! the same digest for the same input.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let d = hash::digest(["a.css", "1f2e"]); // -> "3b1c9a0f77d2e4a1"
//! ```

/// Length of the hex digest used for target names and cache keys.
pub const DIGEST_LEN: usize = 16;

/// Hash an ordered sequence of parts into a short hex digest.
///
/// Parts are separated by a NUL byte so `["ab", "c"]` and `["a", "bc"]`
/// produce different digests.
pub fn digest<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part.as_ref());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex()[..DIGEST_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        let a = digest(["a.css", "123"]);
        let b = digest(["a.css", "123"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), DIGEST_LEN);
    }

    #[test]
    fn test_digest_separates_parts() {
        assert_ne!(digest(["ab", "c"]), digest(["a", "bc"]));
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        assert_ne!(digest(["a", "b"]), digest(["b", "a"]));
    }
}
