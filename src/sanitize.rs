//! Mapping arbitrary text to safe, bounded-length file names.

/// Default maximum length for sanitized file names, in characters.
pub const DEFAULT_MAX_LEN: usize = 80;

/// Characters that are replaced with `_` because some filesystem rejects
/// them in entry names.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Map arbitrary text to a safe file name of at most `max_len` characters.
///
/// Reserved characters become `_`, whitespace runs collapse into a single
/// `_`, the result is truncated to `max_len` characters (not bytes, so a
/// multi-byte character is never split), leading and trailing underscores
/// are stripped, and an empty result falls back to `"audio"`.
///
/// Deterministic, total, and idempotent.
pub fn sanitize(text: &str, max_len: usize) -> String {
    let replaced: String = text
        .chars()
        .map(|ch| if RESERVED.contains(&ch) { '_' } else { ch })
        .collect();

    let joined = replaced.split_whitespace().collect::<Vec<_>>().join("_");
    let truncated: String = joined.chars().take(max_len).collect();
    let stripped = truncated.trim_matches('_');

    if stripped.is_empty() {
        "audio".to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize, DEFAULT_MAX_LEN, RESERVED};

    #[test]
    fn replaces_reserved_characters() {
        let out = sanitize("a<b>c:d\"e/f\\g|h?i*j", DEFAULT_MAX_LEN);
        assert_eq!(out, "a_b_c_d_e_f_g_h_i_j");
        assert!(!out.contains(RESERVED));
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(sanitize("hello   cruel\t\nworld", DEFAULT_MAX_LEN), "hello_cruel_world");
    }

    #[test]
    fn truncates_to_max_length_in_characters() {
        let out = sanitize("abcdefghij", 4);
        assert_eq!(out, "abcd");

        // Multi-byte characters must not be split mid-codepoint.
        let out = sanitize("ééééé", 3);
        assert_eq!(out, "ééé");
    }

    #[test]
    fn strips_edge_underscores() {
        assert_eq!(sanitize("  hello  ", DEFAULT_MAX_LEN), "hello");
        assert_eq!(sanitize("***", DEFAULT_MAX_LEN), "audio");
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(sanitize("", DEFAULT_MAX_LEN), "audio");
        assert_eq!(sanitize("   ", DEFAULT_MAX_LEN), "audio");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Hello, world!",
            "  a/b\\c  ",
            "***",
            "",
            "one   two\tthree",
            "Ünïcödé — very long input that will definitely be truncated somewhere",
        ] {
            let once = sanitize(input, 20);
            assert_eq!(sanitize(&once, 20), once, "not idempotent for {input:?}");
        }
    }
}
