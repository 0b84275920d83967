//! Word counting and word-boundary truncation for free-text comments

/// Number of whitespace-separated words in `text`
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cut `text` after its `max_words`-th word.
///
/// Text within the cap is returned unchanged, so applying this twice is the
/// same as applying it once. Whitespace between the kept words is preserved.
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return "";
    }

    let mut seen = 0;
    let mut in_word = false;
    let mut last_word_end = 0;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                in_word = false;
                last_word_end = idx;
            }
        } else if !in_word {
            if seen == max_words {
                return &text[..last_word_end];
            }
            in_word = true;
            seen += 1;
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
        assert_eq!(count_words("noodles"), 1);
        assert_eq!(count_words("  too   salty\nthis time "), 4);
    }

    #[test]
    fn test_truncate_keeps_text_within_cap() {
        assert_eq!(truncate_words("tasted odd", 5), "tasted odd");
        assert_eq!(truncate_words("tasted odd ", 2), "tasted odd ");
        assert_eq!(truncate_words("", 3), "");
    }

    #[test]
    fn test_truncate_cuts_at_word_boundary() {
        assert_eq!(truncate_words("one two three four", 2), "one two");
        assert_eq!(truncate_words("  one\n two   three", 2), "  one\n two");
        assert_eq!(truncate_words("anything", 0), "");
    }

    #[test]
    fn test_truncate_never_splits_a_word() {
        let text = "crunchy noodles, spicy sauce and extra pepper";
        for cap in 1..8 {
            let cut = truncate_words(text, cap);
            assert!(text.starts_with(cut));
            let rest = &text[cut.len()..];
            assert!(rest.is_empty() || rest.starts_with(char::is_whitespace));
        }
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let text = "the pack was torn and the noodles were stale";
        for cap in 0..12 {
            let once = truncate_words(text, cap);
            assert_eq!(truncate_words(once, cap), once);
            assert!(count_words(once) <= cap);
        }
    }

    #[test]
    fn test_truncate_handles_multibyte_text() {
        assert_eq!(truncate_words("très bon goût épicé", 3), "très bon goût");
    }
}
