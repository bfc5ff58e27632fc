// PostgREST tables: reports, users, boards, threads, posts, likes.

use super::supabase_client::{parse_content_range, SupabaseClient};
use crate::core::board::{
    AreaFilter, Board, BoardId, BoardStore, NewBoard, NewPost, NewThread, Page, PageRequest, Post,
    PostId, Thread, ThreadId,
};
use crate::core::identity::BackendError;
use crate::core::moderation::{Report, ReportStore};
use crate::core::profile::{Profile, ProfileStore, ProfileUpdate};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const AUTHOR_COLUMNS: &str = "display_id,type_name,type_number,family,nickname,avatar_url";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn in_list(ids: &[PostId]) -> String {
    let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("in.({})", joined.join(","))
}

impl SupabaseClient {
    /// Insert one row and return its representation.
    async fn insert_returning<T, R>(&self, table: &str, row: &T) -> Result<R, BackendError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = self
            .http()
            .post(self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(row);
        let mut rows: Vec<R> = self.send(request).await?.json().await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    async fn insert_minimal<T: Serialize + Sync>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), BackendError> {
        let request = self
            .http()
            .post(self.rest_url(table))
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(request).await?;
        Ok(())
    }

    /// Run a ranged select with an exact count.
    async fn select_page<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        page: PageRequest,
    ) -> Result<Page<R>, BackendError> {
        let (from, to) = page.range();
        let request = request
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", from, to))
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        let items = response.json().await?;
        Ok(Page { items, total })
    }
}

#[async_trait]
impl ReportStore for SupabaseClient {
    async fn insert_report(&self, report: &Report) -> Result<(), BackendError> {
        self.insert_minimal("reports", report).await
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let request = self
            .http()
            .get(self.rest_url("users"))
            .query(&[("select", "*".to_string()), ("id", eq(user_id))]);
        let rows: Vec<Profile> = self.send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn create_profile(&self, user_id: &str) -> Result<(), BackendError> {
        self.insert_minimal("users", &json!({ "id": user_id })).await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let request = self
            .http()
            .patch(self.rest_url("users"))
            .query(&[("id", eq(user_id))])
            .header("Prefer", "return=representation")
            .json(update);
        let rows: Vec<Profile> = self.send(request).await?.json().await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }
}

#[derive(Deserialize)]
struct LikedPost {
    post_id: PostId,
}

#[async_trait]
impl BoardStore for SupabaseClient {
    async fn list_boards(
        &self,
        subcategory_id: i64,
        area: &AreaFilter,
    ) -> Result<Vec<Board>, BackendError> {
        let filter = match area {
            AreaFilter::Family(family) => ("family_filter", eq(family)),
            AreaFilter::Type(number) => ("type_filter", eq(number)),
        };
        let request = self.http().get(self.rest_url("boards")).query(&[
            ("select", "*".to_string()),
            ("subcategory_id", eq(subcategory_id)),
            ("board_type", eq(area.area_type().as_str())),
            filter,
            ("order", "created_at.desc".to_string()),
        ]);
        Ok(self.send(request).await?.json().await?)
    }

    async fn insert_board(&self, board: &NewBoard) -> Result<Board, BackendError> {
        self.insert_returning("boards", board).await
    }

    async fn list_threads(
        &self,
        board_id: BoardId,
        page: PageRequest,
    ) -> Result<Page<Thread>, BackendError> {
        let select = format!("*,user:users!threads_user_id_fkey({})", AUTHOR_COLUMNS);
        let request = self.http().get(self.rest_url("threads")).query(&[
            ("select", select),
            ("board_id", eq(board_id)),
            ("order", "is_pinned.desc,updated_at.desc".to_string()),
        ]);
        self.select_page(request, page).await
    }

    async fn insert_thread(&self, thread: &NewThread) -> Result<Thread, BackendError> {
        self.insert_returning("threads", thread).await
    }

    async fn list_posts(
        &self,
        thread_id: ThreadId,
        page: PageRequest,
    ) -> Result<Page<Post>, BackendError> {
        let select = format!("*,user:users!posts_user_id_fkey({})", AUTHOR_COLUMNS);
        let request = self.http().get(self.rest_url("posts")).query(&[
            ("select", select),
            ("thread_id", eq(thread_id)),
            ("is_deleted", eq(false)),
            ("order", "created_at.asc".to_string()),
        ]);
        self.select_page(request, page).await
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError> {
        self.insert_returning("posts", post).await
    }

    async fn soft_delete_post(&self, post_id: PostId) -> Result<(), BackendError> {
        let request = self
            .http()
            .patch(self.rest_url("posts"))
            .query(&[("id", eq(post_id))])
            .json(&json!({ "is_deleted": true }));
        self.send(request).await?;
        Ok(())
    }

    async fn has_like(&self, user_id: &str, post_id: PostId) -> Result<bool, BackendError> {
        let request = self.http().get(self.rest_url("likes")).query(&[
            ("select", "post_id".to_string()),
            ("user_id", eq(user_id)),
            ("post_id", eq(post_id)),
        ]);
        let rows: Vec<LikedPost> = self.send(request).await?.json().await?;
        Ok(!rows.is_empty())
    }

    async fn insert_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        self.insert_minimal("likes", &json!({ "user_id": user_id, "post_id": post_id }))
            .await
    }

    async fn delete_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        let request = self
            .http()
            .delete(self.rest_url("likes"))
            .query(&[("user_id", eq(user_id)), ("post_id", eq(post_id))]);
        self.send(request).await?;
        Ok(())
    }

    async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[PostId],
    ) -> Result<Vec<PostId>, BackendError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = self.http().get(self.rest_url("likes")).query(&[
            ("select", "post_id".to_string()),
            ("user_id", eq(user_id)),
            ("post_id", in_list(post_ids)),
        ]);
        let rows: Vec<LikedPost> = self.send(request).await?.json().await?;
        Ok(rows.into_iter().map(|r| r.post_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_values() {
        assert_eq!(eq("abc"), "eq.abc");
        assert_eq!(eq(false), "eq.false");
        assert_eq!(in_list(&[3, 1, 2]), "in.(3,1,2)");
    }

    #[test]
    fn test_thread_rows_decode_with_author() {
        let body = r#"[{
            "id": 12, "board_id": 3, "user_id": "u1", "title": "雑談",
            "is_pinned": true, "is_locked": false, "reply_count": 4,
            "created_at": "2025-01-02T03:04:05.123456+00:00",
            "updated_at": "2025-01-03T03:04:05+00:00",
            "user": {"display_id": "D-001", "type_name": "探究者", "type_number": 5,
                     "family": "analyst", "nickname": null, "avatar_url": null}
        }]"#;

        let rows: Vec<Thread> = serde_json::from_str(body).unwrap();

        assert_eq!(rows[0].id, 12);
        assert!(rows[0].is_pinned);
        let author = rows[0].user.as_ref().unwrap();
        assert_eq!(author.type_number, Some(5));
        assert_eq!(author.nickname, None);
    }
}
