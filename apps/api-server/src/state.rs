//! Application state - shared across all handlers.

use std::sync::Arc;

use board_core::ports::{BinaryStore, MemberRepository, PostRepository};
use board_core::{MemberService, OrphanSweeper, PostService};
use board_infra::{InMemoryMemberRepository, InMemoryPostRepository, LocalFileStore};

#[cfg(feature = "postgres")]
use board_infra::{PostgresMemberRepository, PostgresPostRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub members: Arc<MemberService>,
    pub sweeper: Arc<OrphanSweeper>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let store: Arc<dyn BinaryStore> = Arc::new(LocalFileStore::new(config.storage.clone()));
        tracing::info!(
            upload_dir = %config.storage.upload_dir.display(),
            thumbnail_dir = %config.storage.thumbnail_dir.display(),
            "Local file store configured"
        );

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match connect_postgres(db_config, config.auto_migrate).await {
                    Ok(db) => {
                        let db = Arc::new(db);
                        let posts = Arc::new(PostgresPostRepository::shared(db.clone()));
                        let members = Arc::new(PostgresMemberRepository::shared(db));
                        let state = Self::assemble(
                            posts,
                            members,
                            store,
                            config.orphan_sweep.grace,
                            config.max_upload_bytes,
                        );
                        tracing::info!("Application state initialized (postgres)");
                        return state;
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        let state = Self::in_memory(store, config.orphan_sweep.grace, config.max_upload_bytes);
        tracing::info!("Application state initialized (in-memory)");
        state
    }

    /// State over in-memory repositories and the given store.
    pub fn in_memory(
        store: Arc<dyn BinaryStore>,
        sweep_grace: chrono::Duration,
        max_upload_bytes: usize,
    ) -> Self {
        let members = Arc::new(InMemoryMemberRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new(members.clone()));
        Self::assemble(posts, members, store, sweep_grace, max_upload_bytes)
    }

    fn assemble<P, M>(
        posts: Arc<P>,
        members: Arc<M>,
        store: Arc<dyn BinaryStore>,
        sweep_grace: chrono::Duration,
        max_upload_bytes: usize,
    ) -> Self
    where
        P: PostRepository + 'static,
        M: MemberRepository + 'static,
    {
        Self {
            posts: Arc::new(PostService::new(
                posts.clone(),
                members.clone(),
                store.clone(),
            )),
            members: Arc::new(MemberService::new(members)),
            sweeper: Arc::new(OrphanSweeper::new(posts, store, sweep_grace)),
            max_upload_bytes,
        }
    }
}

#[cfg(feature = "postgres")]
async fn connect_postgres(
    config: &board_infra::DatabaseConfig,
    auto_migrate: bool,
) -> Result<sea_orm::DatabaseConnection, sea_orm::DbErr> {
    use migration::{Migrator, MigratorTrait};

    let db = board_infra::database::connect(config).await?;
    if auto_migrate {
        Migrator::up(&db, None).await?;
        tracing::info!("Database migrations applied");
    }
    Ok(db)
}
