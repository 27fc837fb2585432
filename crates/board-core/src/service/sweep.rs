//! Reconciliation of blobs that no attachment row references.
//!
//! A failed `create` may leave blobs behind. The sweep deletes those once they
//! are older than a grace period, so uploads still in flight are never touched.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::DomainError;
use crate::ports::{BinaryStore, PostRepository};

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

pub struct OrphanSweeper {
    posts: Arc<dyn PostRepository>,
    store: Arc<dyn BinaryStore>,
    grace: Duration,
}

impl OrphanSweeper {
    pub fn new(posts: Arc<dyn PostRepository>, store: Arc<dyn BinaryStore>, grace: Duration) -> Self {
        Self {
            posts,
            store,
            grace,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, DomainError> {
        let cutoff = Utc::now() - self.grace;
        let blobs = self.store.list_locators().await?;
        let mut report = SweepReport {
            scanned: blobs.len(),
            ..SweepReport::default()
        };

        for blob in blobs {
            if blob.modified_at > cutoff {
                continue;
            }
            if self.posts.is_locator_referenced(&blob.locator).await? {
                continue;
            }

            match self.store.delete(&blob.locator).await {
                Ok(()) => {
                    tracing::debug!(locator = %blob.locator, "Removed orphaned blob");
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!(locator = %blob.locator, error = %e, "Orphan removal failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            removed = report.removed,
            failed = report.failed,
            "Orphan sweep finished"
        );
        Ok(report)
    }
}
