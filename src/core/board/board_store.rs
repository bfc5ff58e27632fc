use super::board_models::{
    AreaFilter, Board, BoardId, NewBoard, NewPost, NewThread, Page, PageRequest, Post, PostId,
    Thread, ThreadId,
};
use crate::core::identity::BackendError;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for the forum tables (boards, threads, posts, likes).
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn list_boards(
        &self,
        subcategory_id: i64,
        area: &AreaFilter,
    ) -> Result<Vec<Board>, BackendError>;

    async fn insert_board(&self, board: &NewBoard) -> Result<Board, BackendError>;

    /// Pinned threads first, then most recently updated.
    async fn list_threads(
        &self,
        board_id: BoardId,
        page: PageRequest,
    ) -> Result<Page<Thread>, BackendError>;

    async fn insert_thread(&self, thread: &NewThread) -> Result<Thread, BackendError>;

    /// Non-deleted posts, oldest first.
    async fn list_posts(
        &self,
        thread_id: ThreadId,
        page: PageRequest,
    ) -> Result<Page<Post>, BackendError>;

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError>;

    async fn soft_delete_post(&self, post_id: PostId) -> Result<(), BackendError>;

    async fn has_like(&self, user_id: &str, post_id: PostId) -> Result<bool, BackendError>;

    async fn insert_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError>;

    async fn delete_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError>;

    /// Which of `post_ids` the user has liked.
    async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[PostId],
    ) -> Result<Vec<PostId>, BackendError>;
}

#[async_trait]
impl<T: BoardStore + ?Sized> BoardStore for Arc<T> {
    async fn list_boards(
        &self,
        subcategory_id: i64,
        area: &AreaFilter,
    ) -> Result<Vec<Board>, BackendError> {
        (**self).list_boards(subcategory_id, area).await
    }

    async fn insert_board(&self, board: &NewBoard) -> Result<Board, BackendError> {
        (**self).insert_board(board).await
    }

    async fn list_threads(
        &self,
        board_id: BoardId,
        page: PageRequest,
    ) -> Result<Page<Thread>, BackendError> {
        (**self).list_threads(board_id, page).await
    }

    async fn insert_thread(&self, thread: &NewThread) -> Result<Thread, BackendError> {
        (**self).insert_thread(thread).await
    }

    async fn list_posts(
        &self,
        thread_id: ThreadId,
        page: PageRequest,
    ) -> Result<Page<Post>, BackendError> {
        (**self).list_posts(thread_id, page).await
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError> {
        (**self).insert_post(post).await
    }

    async fn soft_delete_post(&self, post_id: PostId) -> Result<(), BackendError> {
        (**self).soft_delete_post(post_id).await
    }

    async fn has_like(&self, user_id: &str, post_id: PostId) -> Result<bool, BackendError> {
        (**self).has_like(user_id, post_id).await
    }

    async fn insert_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        (**self).insert_like(user_id, post_id).await
    }

    async fn delete_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        (**self).delete_like(user_id, post_id).await
    }

    async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[PostId],
    ) -> Result<Vec<PostId>, BackendError> {
        (**self).liked_post_ids(user_id, post_ids).await
    }
}
