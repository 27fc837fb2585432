//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;

use board_core::OrphanSweeper;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Add a cron job. Schedules use six fields, seconds first.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Run the orphaned blob sweep on `schedule`.
    pub async fn add_orphan_sweep(
        &self,
        schedule: &str,
        sweeper: Arc<OrphanSweeper>,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(schedule, move || {
            let sweeper = sweeper.clone();
            async move {
                if let Err(e) = sweeper.sweep().await {
                    tracing::error!(error = %e, "Orphan sweep failed");
                }
            }
        })
        .await
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use board_infra::{InMemoryBinaryStore, InMemoryMemberRepository, InMemoryPostRepository};

    #[tokio::test]
    async fn test_rejects_invalid_schedule() {
        let scheduler = Scheduler::new(SchedulerConfig { enabled: false })
            .await
            .unwrap();
        let members = Arc::new(InMemoryMemberRepository::new());
        let sweeper = Arc::new(OrphanSweeper::new(
            Arc::new(InMemoryPostRepository::new(members)),
            Arc::new(InMemoryBinaryStore::new()),
            chrono::Duration::hours(1),
        ));

        assert!(scheduler.add_orphan_sweep("not a cron", sweeper.clone()).await.is_err());
        assert!(scheduler.add_orphan_sweep("0 0 * * * *", sweeper).await.is_ok());
    }
}
