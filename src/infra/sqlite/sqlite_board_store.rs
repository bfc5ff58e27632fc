use super::sqlite_backend::SqliteBackend;
use crate::core::board::{
    AreaFilter, AreaType, AuthorSummary, Board, BoardId, BoardStore, NewBoard, NewPost, NewThread,
    Page, PageRequest, Post, PostId, Thread, ThreadId,
};
use crate::core::identity::BackendError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

/// Author columns joined from `users`, prefixed so they cannot clash.
const AUTHOR_SELECT: &str = r#"
    u.id AS author_id, u.display_id AS author_display_id, u.nickname AS author_nickname,
    u.type_name AS author_type_name, u.type_number AS author_type_number,
    u.family AS author_family, u.avatar_url AS author_avatar_url
"#;

fn author_from_row(row: &SqliteRow) -> Result<Option<AuthorSummary>, sqlx::Error> {
    let author_id: Option<String> = row.try_get("author_id")?;
    if author_id.is_none() {
        return Ok(None);
    }
    Ok(Some(AuthorSummary {
        display_id: row.try_get("author_display_id")?,
        nickname: row.try_get("author_nickname")?,
        type_name: row.try_get("author_type_name")?,
        type_number: row.try_get("author_type_number")?,
        family: row.try_get("author_family")?,
        avatar_url: row.try_get("author_avatar_url")?,
    }))
}

fn board_from_row(row: &SqliteRow) -> Result<Board, BackendError> {
    let board_type: String = row.try_get("board_type")?;
    Ok(Board {
        id: row.try_get("id")?,
        subcategory_id: row.try_get("subcategory_id")?,
        board_type: AreaType::parse(&board_type)
            .ok_or_else(|| BackendError::Storage(format!("Unknown board_type {}", board_type)))?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        icon: row.try_get("icon")?,
        slug: row.try_get("slug")?,
        created_by: row.try_get("created_by")?,
        family_filter: row.try_get("family_filter")?,
        type_filter: row.try_get("type_filter")?,
        created_at: row.try_get("created_at")?,
    })
}

fn thread_from_row(row: &SqliteRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        board_id: row.try_get("board_id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        is_pinned: row.try_get("is_pinned")?,
        is_locked: row.try_get("is_locked")?,
        reply_count: row.try_get("reply_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        user: author_from_row(row)?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        is_deleted: row.try_get("is_deleted")?,
        likes_count: row.try_get("likes_count")?,
        created_at: row.try_get("created_at")?,
        user: author_from_row(row)?,
    })
}

impl SqliteBackend {
    async fn fetch_thread(&self, id: ThreadId) -> Result<Thread, BackendError> {
        let row = sqlx::query(&format!(
            "SELECT t.*, {} FROM threads t LEFT JOIN users u ON u.id = t.user_id WHERE t.id = ?",
            AUTHOR_SELECT
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(thread_from_row(&row)?)
    }

    async fn fetch_post(&self, id: PostId) -> Result<Post, BackendError> {
        let row = sqlx::query(&format!(
            "SELECT p.*, {} FROM posts p LEFT JOIN users u ON u.id = p.user_id WHERE p.id = ?",
            AUTHOR_SELECT
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(post_from_row(&row)?)
    }
}

#[async_trait]
impl BoardStore for SqliteBackend {
    async fn list_boards(
        &self,
        subcategory_id: i64,
        area: &AreaFilter,
    ) -> Result<Vec<Board>, BackendError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM boards WHERE subcategory_id = ");
        query.push_bind(subcategory_id);
        query.push(" AND board_type = ");
        query.push_bind(area.area_type().as_str());
        match area {
            AreaFilter::Family(family) => {
                query.push(" AND family_filter = ");
                query.push_bind(family.clone());
            }
            AreaFilter::Type(number) => {
                query.push(" AND type_filter = ");
                query.push_bind(*number);
            }
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(board_from_row).collect()
    }

    async fn insert_board(&self, board: &NewBoard) -> Result<Board, BackendError> {
        let row = sqlx::query(
            r#"
            INSERT INTO boards (subcategory_id, board_type, name, description, icon, slug,
                                created_by, family_filter, type_filter, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(board.subcategory_id)
        .bind(board.board_type.as_str())
        .bind(&board.name)
        .bind(&board.description)
        .bind(&board.icon)
        .bind(&board.slug)
        .bind(&board.created_by)
        .bind(&board.family_filter)
        .bind(board.type_filter)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        board_from_row(&row)
    }

    async fn list_threads(
        &self,
        board_id: BoardId,
        page: PageRequest,
    ) -> Result<Page<Thread>, BackendError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM threads WHERE board_id = ?")
            .bind(board_id)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT t.*, {} FROM threads t
            LEFT JOIN users u ON u.id = t.user_id
            WHERE t.board_id = ?
            ORDER BY t.is_pinned DESC, julianday(t.updated_at) DESC, t.id DESC
            LIMIT ? OFFSET ?
            "#,
            AUTHOR_SELECT
        ))
        .bind(board_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(thread_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: Some(total as u64),
        })
    }

    async fn insert_thread(&self, thread: &NewThread) -> Result<Thread, BackendError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO threads (board_id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(thread.board_id)
        .bind(&thread.user_id)
        .bind(&thread.title)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_thread(result.last_insert_rowid()).await
    }

    async fn list_posts(
        &self,
        thread_id: ThreadId,
        page: PageRequest,
    ) -> Result<Page<Post>, BackendError> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) FROM posts WHERE thread_id = ? AND is_deleted = 0")
                .bind(thread_id)
                .fetch_one(&self.pool)
                .await?
                .try_get(0)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT p.*, {} FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.thread_id = ? AND p.is_deleted = 0
            ORDER BY julianday(p.created_at) ASC, p.id ASC
            LIMIT ? OFFSET ?
            "#,
            AUTHOR_SELECT
        ))
        .bind(thread_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: Some(total as u64),
        })
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO posts (thread_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post.thread_id)
        .bind(&post.user_id)
        .bind(&post.content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // The opening post is not a reply.
        sqlx::query(
            r#"
            UPDATE threads SET
                reply_count = (SELECT COUNT(*) - 1 FROM posts WHERE thread_id = ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(post.thread_id)
        .bind(now)
        .bind(post.thread_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.fetch_post(result.last_insert_rowid()).await
    }

    async fn soft_delete_post(&self, post_id: PostId) -> Result<(), BackendError> {
        let result = sqlx::query("UPDATE posts SET is_deleted = 1 WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn has_like(&self, user_id: &str, post_id: PostId) -> Result<bool, BackendError> {
        let row = sqlx::query("SELECT 1 FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(post_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_like(&self, user_id: &str, post_id: PostId) -> Result<(), BackendError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() > 0 {
            sqlx::query("UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
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

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id FROM likes WHERE user_id = ");
        query.push_bind(user_id.to_string());
        query.push(" AND post_id IN (");
        let mut separated = query.separated(", ");
        for id in post_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| row.try_get::<i64, _>("post_id"))
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::{ProfileStore, ProfileUpdate};
    use chrono::Duration;

    async fn backend_with_board() -> (SqliteBackend, Board) {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let board = backend
            .insert_board(&NewBoard {
                subcategory_id: 1,
                board_type: AreaType::Type,
                name: "雑談".to_string(),
                description: None,
                icon: "📋".to_string(),
                created_by: "u1".to_string(),
                slug: "user-u1-1".to_string(),
                family_filter: None,
                type_filter: Some(5),
            })
            .await
            .unwrap();
        (backend, board)
    }

    async fn thread(backend: &SqliteBackend, board_id: BoardId, title: &str) -> Thread {
        backend
            .insert_thread(&NewThread {
                board_id,
                user_id: "u1".to_string(),
                title: title.to_string(),
            })
            .await
            .unwrap()
    }

    async fn post(backend: &SqliteBackend, thread_id: ThreadId, content: &str) -> Post {
        backend
            .insert_post(&NewPost {
                thread_id,
                user_id: "u1".to_string(),
                content: content.to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_boards_filter_by_area() {
        let (backend, board) = backend_with_board().await;

        let same = backend
            .list_boards(1, &AreaFilter::Type(5))
            .await
            .unwrap();
        let other = backend
            .list_boards(1, &AreaFilter::Type(6))
            .await
            .unwrap();
        let family = backend
            .list_boards(1, &AreaFilter::Family("analyst".to_string()))
            .await
            .unwrap();

        assert_eq!(same.len(), 1);
        assert_eq!(same[0].id, board.id);
        assert_eq!(same[0].type_filter, Some(5));
        assert!(other.is_empty());
        assert!(family.is_empty());
    }

    #[tokio::test]
    async fn test_posts_page_in_order_and_skip_deleted() {
        let (backend, board) = backend_with_board().await;
        let thread = thread(&backend, board.id, "スレ").await;
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(post(&backend, thread.id, &format!("投稿{}", i)).await.id);
        }
        backend.soft_delete_post(ids[1]).await.unwrap();

        let first = backend
            .list_posts(thread.id, PageRequest::new(1, 3))
            .await
            .unwrap();
        let second = backend
            .list_posts(thread.id, PageRequest::new(2, 3))
            .await
            .unwrap();

        assert_eq!(first.total, Some(4));
        let contents: Vec<&str> = first.items.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["投稿0", "投稿2", "投稿3"]);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].content, "投稿4");
    }

    #[tokio::test]
    async fn test_threads_pinned_first_then_recent() {
        let (backend, board) = backend_with_board().await;
        let old = thread(&backend, board.id, "古い").await;
        let pinned = thread(&backend, board.id, "お知らせ").await;
        let fresh = thread(&backend, board.id, "新しい").await;
        sqlx::query("UPDATE threads SET is_pinned = 1 WHERE id = ?")
            .bind(pinned.id)
            .execute(&backend.pool)
            .await
            .unwrap();
        sqlx::query("UPDATE threads SET updated_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::hours(1))
            .bind(fresh.id)
            .execute(&backend.pool)
            .await
            .unwrap();
        // A reply bumps the old thread above the fresh one.
        post(&backend, old.id, "最初").await;
        post(&backend, old.id, "返信").await;

        let page = backend
            .list_threads(board.id, PageRequest::THREADS)
            .await
            .unwrap();

        let ids: Vec<ThreadId> = page.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![pinned.id, old.id, fresh.id]);
        assert_eq!(page.items[1].reply_count, 1);
    }

    #[tokio::test]
    async fn test_likes_are_unique_and_counted() {
        let (backend, board) = backend_with_board().await;
        let thread = thread(&backend, board.id, "スレ").await;
        let liked = post(&backend, thread.id, "いいね").await;
        let plain = post(&backend, thread.id, "ふつう").await;

        backend.insert_like("u2", liked.id).await.unwrap();
        let dup = backend.insert_like("u2", liked.id).await.unwrap_err();
        assert!(dup.is_conflict());

        assert!(backend.has_like("u2", liked.id).await.unwrap());
        assert_eq!(
            backend
                .liked_post_ids("u2", &[liked.id, plain.id])
                .await
                .unwrap(),
            vec![liked.id]
        );
        assert_eq!(backend.fetch_post(liked.id).await.unwrap().likes_count, 1);

        backend.delete_like("u2", liked.id).await.unwrap();
        assert!(!backend.has_like("u2", liked.id).await.unwrap());
        assert_eq!(backend.fetch_post(liked.id).await.unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn test_posts_carry_author_summary() {
        let (backend, board) = backend_with_board().await;
        backend.create_profile("u1").await.unwrap();
        backend
            .update_profile(
                "u1",
                &ProfileUpdate {
                    nickname: Some("みけ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let thread = thread(&backend, board.id, "スレ").await;

        let created = post(&backend, thread.id, "こんにちは").await;

        let author = created.user.unwrap();
        assert_eq!(author.nickname.as_deref(), Some("みけ"));
        assert!(thread.user.is_some());
    }

    #[tokio::test]
    async fn test_soft_delete_missing_post_is_not_found() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let err = backend.soft_delete_post(999).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }
}
