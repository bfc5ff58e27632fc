// Board domain models - categories, boards, threads, posts, and paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BoardId = i64;
pub type ThreadId = i64;
pub type PostId = i64;

/// A top-level board category. The list mirrors the seeded `board_categories` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const CATEGORIES: [Category; 13] = [
    Category { id: 1, name: "雑談・日常", icon: "💬" },
    Category { id: 2, name: "音楽", icon: "🎵" },
    Category { id: 3, name: "アニメ・マンガ・ゲーム", icon: "🎮" },
    Category { id: 4, name: "映画・ドラマ・動画", icon: "🎬" },
    Category { id: 5, name: "スポーツ・アウトドア", icon: "⚽" },
    Category { id: 6, name: "読書・学習", icon: "📚" },
    Category { id: 7, name: "創作・アート", icon: "🎨" },
    Category { id: 8, name: "グルメ・食", icon: "🍜" },
    Category { id: 9, name: "ファッション・美容", icon: "👗" },
    Category { id: 10, name: "テクノロジー", icon: "💻" },
    Category { id: 11, name: "オフ会・イベント", icon: "🎉" },
    Category { id: 12, name: "お悩み・サポート", icon: "🤝" },
    Category { id: 13, name: "Doppelganger", icon: "🔮" },
];

/// Which area of a subcategory a board lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    Family,
    Type,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Family => "family",
            AreaType::Type => "type",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "family" => Some(AreaType::Family),
            "type" => Some(AreaType::Type),
            _ => None,
        }
    }
}

/// Area restriction derived from the viewer's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaFilter {
    Family(String),
    Type(i32),
}

impl AreaFilter {
    pub fn area_type(&self) -> AreaType {
        match self {
            AreaFilter::Family(_) => AreaType::Family,
            AreaFilter::Type(_) => AreaType::Type,
        }
    }
}

/// Public fields of a post or thread author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(default)]
    pub display_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub type_number: Option<i32>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    pub board_type: AreaType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub family_filter: Option<String>,
    #[serde(default)]
    pub type_filter: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBoard {
    pub subcategory_id: i64,
    pub board_type: AreaType,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub created_by: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub board_id: BoardId,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<AuthorSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewThread {
    pub board_id: BoardId,
    pub user_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<AuthorSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPost {
    pub thread_id: ThreadId,
    pub user_id: String,
    pub content: String,
}

/// 1-based page request. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub const THREADS: PageRequest = PageRequest { page: 1, limit: 20 };
    pub const POSTS: PageRequest = PageRequest { page: 1, limit: 50 };

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Inclusive row range, as used by `Range` headers.
    pub fn range(&self) -> (u64, u64) {
        let from = self.offset();
        (from, from + u64::from(self.limit) - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows, when the backend reports it.
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ranges_are_inclusive() {
        assert_eq!(PageRequest::THREADS.range(), (0, 19));
        assert_eq!(PageRequest::new(3, 50).range(), (100, 149));
        assert_eq!(PageRequest::new(0, 0).range(), (0, 0));
    }

    #[test]
    fn zero_page_and_limit_are_clamped() {
        let page = PageRequest::new(0, 0);
        assert_eq!((page.page(), page.limit()), (1, 1));
        assert_eq!(page.offset(), 0);
        assert_eq!(PageRequest::POSTS.limit(), 50);
    }

    #[test]
    fn category_ids_are_sequential() {
        for (i, category) in CATEGORIES.iter().enumerate() {
            assert_eq!(category.id, i as i64 + 1);
        }
    }

    #[test]
    fn area_type_round_trips_through_str() {
        for area in [AreaType::Family, AreaType::Type] {
            assert_eq!(AreaType::parse(area.as_str()), Some(area));
        }
        assert_eq!(
            serde_json::to_string(&AreaType::Family).unwrap(),
            "\"family\""
        );
    }
}
