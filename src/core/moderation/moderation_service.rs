// Report service - the single gated entry point for abuse reports.
//
// This service handles:
// - Requiring a signed-in reporter
// - Building the report row
// - Translating the store's duplicate-key failure into "already reported"
//
// The store enforces one report per reporter per post; we never dedupe here.

use super::moderation_models::{Report, ReportReason};
use crate::core::identity::{BackendError, IdentityProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("ログインが必要です")]
    AuthRequired,

    #[error("この投稿は既に通報済みです")]
    AlreadyReported,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a report. Returns `BackendError::Conflict` when this reporter
    /// already reported this post.
    async fn insert_report(&self, report: &Report) -> Result<(), BackendError>;
}

#[async_trait]
impl<T: ReportStore + ?Sized> ReportStore for Arc<T> {
    async fn insert_report(&self, report: &Report) -> Result<(), BackendError> {
        (**self).insert_report(report).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<I: IdentityProvider, R: ReportStore> {
    identity: I,
    reports: R,
}

impl<I: IdentityProvider, R: ReportStore> ModerationService<I, R> {
    pub fn new(identity: I, reports: R) -> Self {
        Self { identity, reports }
    }

    /// Submit a report for `post_id` on behalf of the current user.
    pub async fn submit_report(&self, post_id: i64, reason: &str) -> Result<(), ModerationError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(ModerationError::AuthRequired)?;

        let report = Report {
            reporter_id: user.id,
            post_id,
            reason: reason.to_string(),
        };

        match self.reports.insert_report(&report).await {
            Ok(()) => {
                tracing::info!(post_id, reporter_id = %report.reporter_id, "Report submitted");
                Ok(())
            }
            Err(e) if e.is_conflict() => Err(ModerationError::AlreadyReported),
            Err(e) => Err(e.into()),
        }
    }

    /// Submit a report using one of the dialog presets plus optional detail.
    pub async fn submit_preset_report(
        &self,
        post_id: i64,
        reason: ReportReason,
        detail: Option<&str>,
    ) -> Result<(), ModerationError> {
        let detail = if reason.accepts_detail() { detail } else { None };
        self.submit_report(post_id, &reason.compose(detail)).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
