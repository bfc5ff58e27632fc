// SQLite-backed persistence for reports, profiles and the forum tables.
//
// Tables:
// - users: profile rows
// - reports: one row per (reporter, post)
// - boards, threads, posts: forum content; posts are soft-deleted
// - likes: one row per (user, post)

use crate::core::identity::BackendError;
use crate::core::moderation::{Report, ReportStore};
use crate::core::profile::{Profile, ProfileStore, ProfileUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteBackend {
    pub(crate) pool: Pool<Sqlite>,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let path_str = database_url.trim_start_matches("sqlite://");
        if !in_memory && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        // Each connection to :memory: is its own database.
        let mut options = SqlitePoolOptions::new();
        if in_memory {
            options = options.max_connections(1);
        }
        let pool = options.connect(&conn_str).await?;

        let backend = Self { pool };
        backend.migrate().await?;
        Ok(backend)
    }

    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::new("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<(), BackendError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_id TEXT,
                nickname TEXT,
                bio TEXT,
                hobbies TEXT NOT NULL DEFAULT '[]',
                username TEXT UNIQUE,
                avatar_url TEXT,
                type_number INTEGER,
                type_name TEXT,
                family TEXT,
                profile_completed_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id TEXT NOT NULL,
                post_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (reporter_id, post_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS boards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subcategory_id INTEGER,
                board_type TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                icon TEXT,
                slug TEXT UNIQUE,
                created_by TEXT,
                family_filter TEXT,
                type_filter INTEGER,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS threads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                board_id INTEGER NOT NULL REFERENCES boards(id),
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                is_pinned BOOLEAN NOT NULL DEFAULT 0,
                is_locked BOOLEAN NOT NULL DEFAULT 0,
                reply_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_threads_board
                ON threads(board_id, is_pinned, updated_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL REFERENCES threads(id),
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT 0,
                likes_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_thread ON posts(thread_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                user_id TEXT NOT NULL,
                post_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, post_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn profile_from_row(row: &SqliteRow) -> Result<Profile, BackendError> {
    let hobbies: String = row.try_get("hobbies")?;
    Ok(Profile {
        id: row.try_get("id")?,
        display_id: row.try_get("display_id")?,
        nickname: row.try_get("nickname")?,
        bio: row.try_get("bio")?,
        hobbies: serde_json::from_str(&hobbies)
            .map_err(|e| BackendError::Storage(format!("Corrupt hobbies column: {}", e)))?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        type_number: row.try_get("type_number")?,
        type_name: row.try_get("type_name")?,
        family: row.try_get("family")?,
        profile_completed_at: row.try_get::<Option<DateTime<Utc>>, _>("profile_completed_at")?,
    })
}

#[async_trait]
impl ReportStore for SqliteBackend {
    async fn insert_report(&self, report: &Report) -> Result<(), BackendError> {
        sqlx::query(
            "INSERT INTO reports (reporter_id, post_id, reason, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&report.reporter_id)
        .bind(report.post_id)
        .bind(&report.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn create_profile(&self, user_id: &str) -> Result<(), BackendError> {
        sqlx::query("INSERT INTO users (id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(BackendError::NotFound)?;
        let mut profile = profile_from_row(&row)?;
        profile.apply(update);

        let hobbies = serde_json::to_string(&profile.hobbies)
            .map_err(|e| BackendError::Storage(e.to_string()))?;
        sqlx::query(
            r#"
            UPDATE users SET
                nickname = ?, bio = ?, hobbies = ?, username = ?,
                avatar_url = ?, profile_completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.nickname)
        .bind(&profile.bio)
        .bind(hobbies)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .bind(profile.profile_completed_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_duplicate_report_is_conflict() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let report = Report {
            reporter_id: "u1".to_string(),
            post_id: 42,
            reason: "スパム・宣伝".to_string(),
        };

        backend.insert_report(&report).await.unwrap();
        let second = backend.insert_report(&report).await;

        assert!(matches!(second, Err(ref e) if e.is_conflict()));

        // Another reporter on the same post is fine.
        let other = Report {
            reporter_id: "u2".to_string(),
            ..report
        };
        backend.insert_report(&other).await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_round_trip_on_disk() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        {
            let backend = SqliteBackend::new(&path).await.unwrap();
            backend.create_profile("u1").await.unwrap();
            backend
                .update_profile(
                    "u1",
                    &ProfileUpdate {
                        nickname: Some("ふくろう".to_string()),
                        hobbies: Some(vec!["読書".to_string(), "散歩".to_string()]),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let reopened = SqliteBackend::new(&path).await.unwrap();
        let profile = reopened.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.nickname.as_deref(), Some("ふくろう"));
        assert_eq!(profile.hobbies, vec!["読書", "散歩"]);
        assert_eq!(profile.bio, None);
    }

    #[tokio::test]
    async fn test_create_profile_twice_conflicts() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        backend.create_profile("u1").await.unwrap();

        let err = backend.create_profile("u1").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_missing_profile_is_not_found() {
        let backend = SqliteBackend::in_memory().await.unwrap();

        let err = backend
            .update_profile("ghost", &ProfileUpdate::avatar_url(None))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::NotFound));
    }

    #[tokio::test]
    async fn test_avatar_url_can_be_cleared() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        backend.create_profile("u1").await.unwrap();
        backend
            .update_profile("u1", &ProfileUpdate::avatar_url(Some("https://x/a.webp".into())))
            .await
            .unwrap();

        let cleared = backend
            .update_profile("u1", &ProfileUpdate::avatar_url(None))
            .await
            .unwrap();

        assert_eq!(cleared.avatar_url, None);
    }
}
