// Text filter for titles and post bodies.
//
// Pure functions of the input and the static rule bank, so the same text
// always gets the same verdict. Lengths are counted in UTF-16 code units to
// match what the browser-side form counts.

use super::moderation_models::{ModerationVerdict, RejectReason};
use super::moderation_rules;

/// Maximum post body length, measured on the untrimmed text.
pub const MAX_CONTENT_LENGTH: usize = 2000;
/// Maximum thread/board title length, measured on the untrimmed text.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Check a post body.
pub fn check_content(text: Option<&str>) -> ModerationVerdict {
    check_text(
        text,
        MAX_CONTENT_LENGTH,
        RejectReason::EmptyContent,
        RejectReason::ContentTooLong,
    )
}

/// Check a thread or board title.
pub fn check_title(text: Option<&str>) -> ModerationVerdict {
    check_text(
        text,
        MAX_TITLE_LENGTH,
        RejectReason::EmptyTitle,
        RejectReason::TitleTooLong,
    )
}

fn check_text(
    text: Option<&str>,
    max_len: usize,
    empty: RejectReason,
    too_long: RejectReason,
) -> ModerationVerdict {
    let text = match text {
        Some(t) if !trim_text(t).is_empty() => t,
        _ => return ModerationVerdict::reject(empty),
    };

    if utf16_len(text) > max_len {
        return ModerationVerdict::reject(too_long);
    }

    if let Some(rule) = moderation_rules::first_match(text) {
        tracing::debug!(category = %rule.category, "Text blocked by moderation rule");
        return ModerationVerdict::reject(RejectReason::BlockedContent);
    }

    ModerationVerdict::accept()
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Strip surrounding whitespace, including a byte-order mark (U+FEFF).
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Keep at most `max` UTF-16 code units, never splitting a surrogate pair.
pub fn truncate_utf16(text: &str, max: usize) -> String {
    let mut units = 0;
    let end = text
        .char_indices()
        .find_map(|(idx, c)| {
            units += c.len_utf16();
            (units > max).then_some(idx)
        })
        .unwrap_or(text.len());
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(v: ModerationVerdict) -> Option<RejectReason> {
        v.reason()
    }

    #[test]
    fn test_plain_text_accepted() {
        assert!(check_content(Some("今日はいい天気ですね。散歩に行きました")).is_accepted());
        assert!(check_title(Some("おすすめの本を語るスレ")).is_accepted());
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        for text in [None, Some(""), Some("   "), Some("\n\t"), Some("\u{3000}\u{3000}")] {
            assert_eq!(reason(check_content(text)), Some(RejectReason::EmptyContent));
            assert_eq!(reason(check_title(text)), Some(RejectReason::EmptyTitle));
        }
    }

    #[test]
    fn test_content_length_uses_untrimmed_text() {
        let exact = "あ".repeat(MAX_CONTENT_LENGTH);
        assert!(check_content(Some(&exact)).is_accepted());

        // Trailing whitespace still counts toward the limit.
        let padded = format!("{} ", exact);
        assert_eq!(
            reason(check_content(Some(&padded))),
            Some(RejectReason::ContentTooLong)
        );
    }

    #[test]
    fn test_too_long_wins_over_blocked_patterns() {
        let long_with_url = format!("{} https://example.com", "a".repeat(MAX_CONTENT_LENGTH));
        assert_eq!(
            reason(check_content(Some(&long_with_url))),
            Some(RejectReason::ContentTooLong)
        );
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // Each emoji is two UTF-16 code units.
        let emoji = "😀".repeat(51);
        assert_eq!(reason(check_title(Some(&emoji))), Some(RejectReason::TitleTooLong));
        let fits = "😀".repeat(50);
        assert!(check_title(Some(&fits)).is_accepted());
    }

    #[test]
    fn test_byte_order_mark_counts_as_blank() {
        assert_eq!(reason(check_content(Some("\u{feff}"))), Some(RejectReason::EmptyContent));
        assert_eq!(reason(check_title(Some(" \u{feff}\n"))), Some(RejectReason::EmptyTitle));
        assert_eq!(trim_text("\u{feff} 本文 \u{feff}"), "本文");
    }

    #[test]
    fn test_truncate_counts_utf16_units() {
        let emoji = "😀".repeat(40);
        let cut = truncate_utf16(&emoji, 40);
        assert_eq!(cut.encode_utf16().count(), 40);
        assert_eq!(cut.chars().count(), 20);

        // A pair that would straddle the limit is dropped whole.
        assert_eq!(truncate_utf16("ab😀", 3), "ab");
        assert_eq!(truncate_utf16("短い", 40), "短い");
    }

    #[test]
    fn test_title_limit() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(reason(check_title(Some(&title))), Some(RejectReason::TitleTooLong));
        // The same text is fine as a post body.
        assert!(check_content(Some(&title)).is_accepted());
    }

    #[test]
    fn test_url_blocked() {
        assert_eq!(
            reason(check_content(Some("連絡先は http://example.com/xyz です"))),
            Some(RejectReason::BlockedContent)
        );
    }

    #[test]
    fn test_email_blocked() {
        assert_eq!(
            reason(check_content(Some("test.user@example.co.jp まで"))),
            Some(RejectReason::BlockedContent)
        );
    }

    #[test]
    fn test_phone_blocked_in_title() {
        assert_eq!(
            reason(check_title(Some("090-1234-5678 に電話して"))),
            Some(RejectReason::BlockedContent)
        );
    }

    #[test]
    fn test_title_and_content_share_blocked_reason() {
        let text = "彼氏募集してます";
        assert_eq!(reason(check_title(Some(text))), Some(RejectReason::BlockedContent));
        assert_eq!(reason(check_content(Some(text))), Some(RejectReason::BlockedContent));
    }

    #[test]
    fn test_check_is_idempotent() {
        for text in ["普通の投稿", "LINE ID: abc", "", "https://a.b"] {
            assert_eq!(check_content(Some(text)), check_content(Some(text)));
        }
    }
}
