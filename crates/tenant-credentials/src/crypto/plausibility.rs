//! Sanity checks applied to every decrypted value
//!
//! AES-GCM already guarantees integrity. These checks catch values that
//! authenticate correctly but cannot be real provider credentials, such as a
//! record encrypted from a placeholder or a zero-filled buffer.

use crate::error::{PipelineError, Result};

pub const MIN_PLAINTEXT_CHARS: usize = 3;
pub const MAX_PLAINTEXT_CHARS: usize = 1000;

/// Longest repeating unit treated as a low-entropy pattern
const MAX_PATTERN_PERIOD: usize = 4;

/// Minimum number of repetitions of a unit before it counts as a pattern
const MIN_PATTERN_REPEATS: usize = 3;

/// Validate a decrypted value without copying it
pub fn check_plaintext(value: &str) -> Result<()> {
    let length = value.chars().count();
    if length < MIN_PLAINTEXT_CHARS {
        return Err(PipelineError::ImplausiblePlaintext(format!(
            "value shorter than {} characters",
            MIN_PLAINTEXT_CHARS
        )));
    }
    if length > MAX_PLAINTEXT_CHARS {
        return Err(PipelineError::ImplausiblePlaintext(format!(
            "value longer than {} characters",
            MAX_PLAINTEXT_CHARS
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(PipelineError::ImplausiblePlaintext(
            "value contains control characters".to_string(),
        ));
    }

    if is_low_entropy(value) {
        return Err(PipelineError::ImplausiblePlaintext(
            "value is a repeated pattern".to_string(),
        ));
    }

    Ok(())
}

/// True when the value is a single repeated character or a short unit
/// (at most four characters) repeated across the whole value, a partial
/// trailing unit included.
fn is_low_entropy(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();

    let first = chars[0];
    if chars.iter().all(|c| *c == first) {
        return true;
    }

    (2..=MAX_PATTERN_PERIOD).any(|period| {
        chars.len() >= period * MIN_PATTERN_REPEATS
            && chars
                .iter()
                .enumerate()
                .all(|(i, c)| *c == chars[i % period])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_realistic_credentials() {
        assert!(check_plaintext("GTWADFxIpUfDoNikNGqq1C3023evM6UH").is_ok());
        assert!(check_plaintext(
            "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919"
        )
        .is_ok());
        assert!(check_plaintext("abc").is_ok());
    }

    #[test]
    fn test_rejects_length_bounds() {
        assert!(check_plaintext("ab").is_err());
        assert!(check_plaintext(&"ab1".repeat(400)).is_err());
    }

    #[test]
    fn test_rejects_control_characters() {
        let err = check_plaintext("key\0value").unwrap_err();
        assert_eq!(err.code(), "IMPLAUSIBLE_PLAINTEXT");
        assert!(check_plaintext("line\nbreak").is_err());
    }

    #[test]
    fn test_rejects_repeated_patterns() {
        assert!(check_plaintext("aaaaaaaa").is_err());
        assert!(check_plaintext("xxx").is_err());
        assert!(check_plaintext("abababab").is_err());
        assert!(check_plaintext("abcdabcdabcdabcd").is_err());
        // A partial trailing unit is still the same pattern
        assert!(check_plaintext("ababababa").is_err());
        assert!(check_plaintext("abcdabcdabcdabcdab").is_err());
        assert!(check_plaintext("abcabcabcabcab").is_err());
        assert!(check_plaintext("abcdabcdabcdab").is_err());
        // Too few repetitions to be called a pattern
        assert!(check_plaintext("abcabc").is_ok());
    }
}
