// The static rule bank used by the text filter.
//
// Rules are compiled once on first use and never change at runtime.
// Order matters only for which rule is reported in debug logs; any hit blocks.

use once_cell::sync::Lazy;
use regex::Regex;

/// What kind of disclosure a rule is tuned to catch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    PhoneNumber,
    Email,
    LineId,
    TwitterHandle,
    InstagramHandle,
    DiscordHandle,
    PersonalInfoRequest,
    MeetupSolicitation,
    Url,
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternCategory::PhoneNumber => write!(f, "Phone Number"),
            PatternCategory::Email => write!(f, "Email"),
            PatternCategory::LineId => write!(f, "LINE ID"),
            PatternCategory::TwitterHandle => write!(f, "Twitter Handle"),
            PatternCategory::InstagramHandle => write!(f, "Instagram Handle"),
            PatternCategory::DiscordHandle => write!(f, "Discord Handle"),
            PatternCategory::PersonalInfoRequest => write!(f, "Personal Info Request"),
            PatternCategory::MeetupSolicitation => write!(f, "Meetup Solicitation"),
            PatternCategory::Url => write!(f, "URL"),
        }
    }
}

/// A single detector: one category, one regex.
#[derive(Debug)]
pub struct PatternRule {
    pub category: PatternCategory,
    regex: Regex,
}

impl PatternRule {
    fn new(category: PatternCategory, pattern: &str) -> Self {
        Self {
            category,
            regex: Regex::new(pattern).expect("built-in moderation pattern must compile"),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    use PatternCategory::*;

    vec![
        // Hyphens may be ASCII, long-vowel mark or minus sign; digits may be full-width.
        PatternRule::new(
            PhoneNumber,
            r"0[0-9０-９]{1,4}[-ー−]?[0-9０-９]{1,4}[-ー−]?[0-9０-９]{3,4}",
        ),
        PatternRule::new(Email, r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}"),
        PatternRule::new(
            LineId,
            r"(?i)(?:LINE|ライン|らいん)\s*(?:ID|ＩＤ|id|アイディー)?\s*[:：]?\s*[a-zA-Z0-9._\-]+",
        ),
        PatternRule::new(
            TwitterHandle,
            r"(?i)(?:Twitter|ツイッター|@)\s*[:：]?\s*@?[a-zA-Z0-9_]{1,15}",
        ),
        PatternRule::new(
            InstagramHandle,
            r"(?i)(?:Instagram|インスタ|いんすた)\s*[:：]?\s*@?[a-zA-Z0-9._]+",
        ),
        PatternRule::new(
            DiscordHandle,
            r"(?i)(?:Discord|ディスコード|ディスコ)\s*[:：]?\s*[a-zA-Z0-9._#]+",
        ),
        PatternRule::new(
            PersonalInfoRequest,
            r"(?:個人|住所|本名|実名|電話番号|連絡先)\s*(?:教えて|おしえて|晒して|さらして|交換)",
        ),
        PatternRule::new(
            MeetupSolicitation,
            r"(?:会いたい|あいたい|デート|でーと|付き合|つきあ|彼氏|彼女|恋人)\s*(?:募集|ぼしゅう|探し|さがし|なりたい|ほしい)",
        ),
        PatternRule::new(Url, r"(?i)https?://\S+"),
    ]
});

/// The process-wide rule bank, in evaluation order.
pub fn rules() -> &'static [PatternRule] {
    &RULES
}

/// First rule that matches `text`, if any.
pub fn first_match(text: &str) -> Option<&'static PatternRule> {
    rules().iter().find(|rule| rule.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_of(text: &str) -> Option<PatternCategory> {
        first_match(text).map(|r| r.category)
    }

    #[test]
    fn all_rules_compile_in_order() {
        let categories: Vec<_> = rules().iter().map(|r| r.category).collect();
        assert_eq!(categories.first(), Some(&PatternCategory::PhoneNumber));
        assert_eq!(categories.last(), Some(&PatternCategory::Url));
        assert_eq!(categories.len(), 9);
    }

    #[test]
    fn phone_numbers_with_hyphen_variants() {
        assert_eq!(category_of("090-1234-5678"), Some(PatternCategory::PhoneNumber));
        assert_eq!(category_of("09012345678"), Some(PatternCategory::PhoneNumber));
        assert_eq!(category_of("090ー１２３４ー５６７８"), Some(PatternCategory::PhoneNumber));
        assert_eq!(category_of("03−1234−5678"), Some(PatternCategory::PhoneNumber));
    }

    #[test]
    fn short_numbers_are_not_phones() {
        assert_eq!(category_of("第3話が最高"), None);
        assert_eq!(category_of("2024年の目標"), None);
    }

    #[test]
    fn messaging_handles() {
        assert_eq!(category_of("LINE ID: abc_123"), Some(PatternCategory::LineId));
        assert_eq!(category_of("らいん：hogehoge"), Some(PatternCategory::LineId));
        assert_eq!(category_of("ツイッター @someone"), Some(PatternCategory::TwitterHandle));
        assert_eq!(category_of("@someone フォローして"), Some(PatternCategory::TwitterHandle));
        assert_eq!(category_of("インスタ: my.account"), Some(PatternCategory::InstagramHandle));
        assert_eq!(category_of("discord user#1234"), Some(PatternCategory::DiscordHandle));
    }

    #[test]
    fn japanese_solicitation_phrases() {
        assert_eq!(category_of("住所教えて"), Some(PatternCategory::PersonalInfoRequest));
        assert_eq!(category_of("連絡先 交換しませんか"), Some(PatternCategory::PersonalInfoRequest));
        assert_eq!(category_of("彼女募集中です"), Some(PatternCategory::MeetupSolicitation));
        assert_eq!(category_of("会いたい人さがしてます"), None);
        assert_eq!(category_of("会いたい さがしてます"), Some(PatternCategory::MeetupSolicitation));
    }

    #[test]
    fn urls_case_insensitive() {
        assert_eq!(category_of("HTTPS://Example.com"), Some(PatternCategory::Url));
        assert_eq!(category_of("http:// だけ"), None);
    }
}
