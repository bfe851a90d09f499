/// Longest stem (in characters) a suggestion may produce.
pub const MAX_STEM_LEN: usize = 100;

/// Turns free-form AI text into a filesystem-safe stem.
///
/// Whitespace runs collapse into a single `_`, anything outside
/// `[A-Za-z0-9_]` is dropped and the result is cut at [`MAX_STEM_LEN`].
/// May return an empty string; callers substitute their fallback stem.
pub fn sanitize(raw: &str) -> String {
    let mut stem = String::with_capacity(raw.len().min(MAX_STEM_LEN));
    let mut in_whitespace = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            stem.push(c);
        }
    }

    // Output is pure ASCII, so byte length equals character count.
    stem.truncate(MAX_STEM_LEN);
    stem
}

/// Sanitizes `raw`, substituting `fallback` when nothing usable survives.
pub fn stem_or_fallback(raw: &str, fallback: &str) -> String {
    let stem = sanitize(raw);
    if !stem.is_empty() {
        return stem;
    }

    let fallback = sanitize(fallback);
    if fallback.is_empty() {
        DEFAULT_FALLBACK_STEM.to_string()
    } else {
        fallback
    }
}

pub const DEFAULT_FALLBACK_STEM: &str = "new_photo";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_with_punctuation() {
        assert_eq!(sanitize("Sunset Over The Bay!!"), "Sunset_Over_The_Bay");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(sanitize("a \t\n b"), "a_b");
        assert_eq!(sanitize("  leading"), "_leading");
    }

    #[test]
    fn test_strips_non_ascii_and_symbols() {
        assert_eq!(sanitize("Çay-bahçesi.jpg"), "aybahesijpg");
        assert_eq!(sanitize("!!!"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_whitespace_between_stripped_chars() {
        assert_eq!(sanitize("a - b"), "a__b");
    }

    #[test]
    fn test_truncates_to_limit() {
        let long = "x".repeat(250);
        assert_eq!(sanitize(&long).len(), MAX_STEM_LEN);
    }

    #[test]
    fn test_idempotent_and_charset() {
        let inputs = [
            "Sunset Over The Bay!!",
            "  many   spaces  ",
            "ünïcödé ÅND émoji 🌅 text",
            "tab\tand\nnewline",
            &"word ".repeat(40),
            "__already_clean__",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
            assert!(once.len() <= MAX_STEM_LEN);
            assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn test_fallback_for_empty_stem() {
        assert_eq!(stem_or_fallback("???", "new_photo"), "new_photo");
        assert_eq!(stem_or_fallback("???", "!!"), DEFAULT_FALLBACK_STEM);
        assert_eq!(stem_or_fallback("dog park", "new_photo"), "dog_park");
    }
}
