// Moderation domain models - verdicts for submitted text and abuse reports.
//
// These are pure domain types with no backend dependencies.
// The board layer turns a rejected verdict into a user-facing error.

use serde::{Deserialize, Serialize};

/// Why a piece of text was refused.
///
/// Every rule hit collapses into `BlockedContent`; callers never learn which
/// rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyContent,
    ContentTooLong,
    EmptyTitle,
    TitleTooLong,
    BlockedContent,
}

impl RejectReason {
    /// User-facing message, shown verbatim.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::EmptyContent => "投稿内容を入力してください",
            RejectReason::ContentTooLong => "投稿は2000文字以内にしてください",
            RejectReason::EmptyTitle => "タイトルを入力してください",
            RejectReason::TitleTooLong => "タイトルは100文字以内にしてください",
            RejectReason::BlockedContent => {
                "個人情報・連絡先・URL・出会い目的の投稿は禁止されています"
            }
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of checking a title or post body.
///
/// A rejected verdict always carries a reason; the fields are private so the
/// two constructors are the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationVerdict {
    accepted: bool,
    reason: Option<RejectReason>,
}

impl ModerationVerdict {
    /// Create an "accepted" verdict
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// Create a rejection with its reason
    pub fn reject(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn reason(&self) -> Option<RejectReason> {
        self.reason
    }

    /// Convert into a `Result`, handy for `?` in submission handlers.
    pub fn into_result(self) -> Result<(), RejectReason> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// A report row as forwarded to the data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub reporter_id: String,
    pub post_id: i64,
    pub reason: String,
}

/// Preset reasons offered by the report dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportReason {
    PersonalInfo,
    MeetupSolicitation,
    Harassment,
    Spam,
    Other,
}

impl ReportReason {
    pub const ALL: [ReportReason; 5] = [
        ReportReason::PersonalInfo,
        ReportReason::MeetupSolicitation,
        ReportReason::Harassment,
        ReportReason::Spam,
        ReportReason::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportReason::PersonalInfo => "個人情報の掲載",
            ReportReason::MeetupSolicitation => "出会い目的の投稿",
            ReportReason::Harassment => "誹謗中傷・攻撃的な内容",
            ReportReason::Spam => "スパム・宣伝",
            ReportReason::Other => "その他の違反",
        }
    }

    /// The dialog only asks for free text when "other" is picked.
    pub fn accepts_detail(&self) -> bool {
        matches!(self, ReportReason::Other)
    }

    /// Join the preset label with optional detail text: `"<label>: <detail>"`.
    pub fn compose(&self, detail: Option<&str>) -> String {
        match detail.filter(|d| !d.is_empty()) {
            Some(detail) => format!("{}: {}", self.label(), detail),
            None => self.label().to_string(),
        }
    }
}

impl std::fmt::Display for ReportReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
