//! Session identifier generation
//!
//! Conversation placeholders and handoff identifiers live in separate
//! namespaces (`web_` and `whatsapp_` prefixes) so the service can tell a
//! provisional chat session from a handoff attempt.

use chrono::Utc;
use rand::Rng;

/// Prefix for provisional conversation session identifiers
pub const PLACEHOLDER_PREFIX: &str = "web_";

/// Prefix for handoff pre-authorization identifiers
pub const HANDOFF_PREFIX: &str = "whatsapp_";

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const HANDOFF_SUFFIX_LEN: usize = 9;

/// Current wall-clock time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Build a provisional conversation session identifier
///
/// # Examples
///
/// ```
/// use leadchat::session::id::placeholder_session_id;
///
/// assert_eq!(placeholder_session_id(1700000000000), "web_1700000000000");
/// ```
pub fn placeholder_session_id(epoch_millis: i64) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, epoch_millis)
}

/// Build a handoff identifier with a random base36 suffix
///
/// # Examples
///
/// ```
/// use leadchat::session::id::handoff_session_id;
///
/// let id = handoff_session_id(1700000000000, &mut rand::rng());
/// assert!(id.starts_with("whatsapp_1700000000000_"));
/// assert_eq!(id.len(), "whatsapp_1700000000000_".len() + 9);
/// ```
pub fn handoff_session_id<R: Rng + ?Sized>(epoch_millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..HANDOFF_SUFFIX_LEN)
        .map(|_| BASE36_ALPHABET[rng.random_range(0..BASE36_ALPHABET.len())] as char)
        .collect();
    format!("{}{}_{}", HANDOFF_PREFIX, epoch_millis, suffix)
}

/// Whether an identifier is a locally synthesized placeholder
pub fn is_placeholder(session_id: &str) -> bool {
    session_id
        .strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    #[test]
    fn test_placeholder_matches_format() {
        let re = Regex::new(r"^web_\d+$").unwrap();
        assert!(re.is_match(&placeholder_session_id(now_millis())));
    }

    #[test]
    fn test_handoff_id_matches_format() {
        let re = Regex::new(r"^whatsapp_\d+_[0-9a-z]{9}$").unwrap();
        let mut rng = rand::rng();
        for _ in 0..50 {
            let id = handoff_session_id(now_millis(), &mut rng);
            assert!(re.is_match(&id), "bad handoff id: {}", id);
        }
    }

    #[test]
    fn test_handoff_id_is_deterministic_for_seeded_rng() {
        let a = handoff_session_id(1, &mut StdRng::seed_from_u64(7));
        let b = handoff_session_id(1, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder("web_1700000000000"));
        assert!(!is_placeholder("web_"));
        assert!(!is_placeholder("web_abc"));
        assert!(!is_placeholder("sess-42"));
        assert!(!is_placeholder("whatsapp_1_abcdefghi"));
    }
}
