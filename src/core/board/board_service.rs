// Board service - boards, threads, posts and likes.
//
// Every submission runs the moderation filter before anything else, so a
// rejected title or body never reaches the identity provider or the store.

use super::board_models::{
    AreaFilter, AreaType, Board, BoardId, Category, NewBoard, NewPost, NewThread, Page,
    PageRequest, Post, PostId, Thread, ThreadId, CATEGORIES,
};
use super::board_store::BoardStore;
use crate::core::identity::{BackendError, IdentityProvider, User};
use crate::core::moderation::{
    check_content, check_title, trim_text, truncate_utf16, RejectReason,
};
use crate::core::profile::Profile;
use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;

pub const MAX_BOARD_NAME_CHARS: usize = 40;
pub const MAX_BOARD_DESCRIPTION_CHARS: usize = 100;
pub const DEFAULT_BOARD_ICON: &str = "📋";

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0}")]
    Rejected(RejectReason),

    #[error("ログインが必要です")]
    AuthRequired,

    /// The profile has no family or type number for the requested area.
    #[error("診断結果が登録されていません")]
    AreaUnavailable,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<RejectReason> for BoardError {
    fn from(reason: RejectReason) -> Self {
        BoardError::Rejected(reason)
    }
}

/// Input for `BoardService::create_board`.
#[derive(Debug, Clone)]
pub struct NewBoardRequest<'a> {
    pub subcategory_id: i64,
    pub area_type: AreaType,
    pub profile: &'a Profile,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub icon: Option<&'a str>,
}

pub struct BoardService<I: IdentityProvider, B: BoardStore> {
    identity: I,
    store: B,
}

impl<I: IdentityProvider, B: BoardStore> BoardService<I, B> {
    pub fn new(identity: I, store: B) -> Self {
        Self { identity, store }
    }

    pub fn categories(&self) -> &'static [Category] {
        &CATEGORIES
    }

    /// Boards in a subcategory visible to `profile` in the given area.
    pub async fn list_boards(
        &self,
        subcategory_id: i64,
        area_type: AreaType,
        profile: &Profile,
    ) -> Result<Vec<Board>, BoardError> {
        let area = area_filter(area_type, profile).ok_or(BoardError::AreaUnavailable)?;
        Ok(self.store.list_boards(subcategory_id, &area).await?)
    }

    pub async fn create_board(&self, request: NewBoardRequest<'_>) -> Result<Board, BoardError> {
        check_title(Some(request.name)).into_result()?;
        let user = self.require_user().await?;
        let area = area_filter(request.area_type, request.profile)
            .ok_or(BoardError::AreaUnavailable)?;

        let (family_filter, type_filter) = match area {
            AreaFilter::Family(family) => (Some(family), None),
            AreaFilter::Type(number) => (None, Some(number)),
        };

        let board = NewBoard {
            subcategory_id: request.subcategory_id,
            board_type: request.area_type,
            name: truncate_utf16(trim_text(request.name), MAX_BOARD_NAME_CHARS),
            description: request
                .description
                .map(trim_text)
                .filter(|d| !d.is_empty())
                .map(|d| truncate_utf16(d, MAX_BOARD_DESCRIPTION_CHARS)),
            icon: request
                .icon
                .filter(|i| !i.is_empty())
                .unwrap_or(DEFAULT_BOARD_ICON)
                .to_string(),
            slug: board_slug(&user.id, Utc::now().timestamp_millis()),
            created_by: user.id,
            family_filter,
            type_filter,
        };

        let created = self.store.insert_board(&board).await?;
        tracing::info!(board_id = created.id, slug = %board.slug, "Board created");
        Ok(created)
    }

    /// Create a thread together with its opening post.
    pub async fn create_thread(
        &self,
        board_id: BoardId,
        title: &str,
        first_post: &str,
    ) -> Result<Thread, BoardError> {
        check_title(Some(title)).into_result()?;
        check_content(Some(first_post)).into_result()?;
        let user = self.require_user().await?;

        let thread = self
            .store
            .insert_thread(&NewThread {
                board_id,
                user_id: user.id.clone(),
                title: trim_text(title).to_string(),
            })
            .await?;

        self.store
            .insert_post(&NewPost {
                thread_id: thread.id,
                user_id: user.id,
                content: trim_text(first_post).to_string(),
            })
            .await?;

        tracing::info!(board_id, thread_id = thread.id, "Thread created");
        Ok(thread)
    }

    pub async fn create_post(&self, thread_id: ThreadId, content: &str) -> Result<Post, BoardError> {
        check_content(Some(content)).into_result()?;
        let user = self.require_user().await?;

        let post = self
            .store
            .insert_post(&NewPost {
                thread_id,
                user_id: user.id,
                content: trim_text(content).to_string(),
            })
            .await?;

        tracing::debug!(thread_id, post_id = post.id, "Post created");
        Ok(post)
    }

    /// Soft delete; the row stays but drops out of listings.
    pub async fn delete_post(&self, post_id: PostId) -> Result<(), BoardError> {
        self.store.soft_delete_post(post_id).await?;
        Ok(())
    }

    /// Flip the current user's like on a post. Returns whether it is now liked.
    pub async fn toggle_like(&self, post_id: PostId) -> Result<bool, BoardError> {
        let user = self.require_user().await?;

        if self.store.has_like(&user.id, post_id).await? {
            self.store.delete_like(&user.id, post_id).await?;
            Ok(false)
        } else {
            self.store.insert_like(&user.id, post_id).await?;
            Ok(true)
        }
    }

    /// Which of `post_ids` the current user has liked.
    pub async fn my_likes(&self, post_ids: &[PostId]) -> Result<HashSet<PostId>, BoardError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let Some(user) = self.identity.current_user().await? else {
            return Ok(HashSet::new());
        };

        let liked = self.store.liked_post_ids(&user.id, post_ids).await?;
        Ok(liked.into_iter().collect())
    }

    pub async fn list_threads(
        &self,
        board_id: BoardId,
        page: PageRequest,
    ) -> Result<Page<Thread>, BoardError> {
        Ok(self.store.list_threads(board_id, page).await?)
    }

    pub async fn list_posts(
        &self,
        thread_id: ThreadId,
        page: PageRequest,
    ) -> Result<Page<Post>, BoardError> {
        Ok(self.store.list_posts(thread_id, page).await?)
    }

    async fn require_user(&self) -> Result<User, BoardError> {
        self.identity
            .current_user()
            .await?
            .ok_or(BoardError::AuthRequired)
    }
}

/// The area restriction `profile` falls under, if its diagnosis is filled in.
pub fn area_filter(area_type: AreaType, profile: &Profile) -> Option<AreaFilter> {
    match area_type {
        AreaType::Family => profile
            .family
            .clone()
            .filter(|f| !f.is_empty())
            .map(AreaFilter::Family),
        AreaType::Type => profile.type_number.map(AreaFilter::Type),
    }
}

fn board_slug(user_id: &str, millis: i64) -> String {
    let prefix: String = user_id.chars().take(8).collect();
    format!("user-{}-{}", prefix, millis)
}
