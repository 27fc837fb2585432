//! In-memory post repository - used when no database is configured and in tests.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use board_core::domain::{
    Attachment, AttachmentId, NewPost, Page, PageRequest, Post, PostDetail, PostId, PostSummary,
};
use board_core::error::RepoError;
use board_core::ports::{MemberDirectory, PostRepository};

struct PostTable {
    rows: BTreeMap<PostId, Post>,
    next_post_id: PostId,
    next_attachment_id: AttachmentId,
}

/// Post store backed by a `BTreeMap` under an async `RwLock`.
///
/// Every write takes the lock once, so an insert with attachments and the
/// view counter increment are atomic with respect to other callers.
pub struct InMemoryPostRepository {
    table: RwLock<PostTable>,
    members: Arc<dyn MemberDirectory>,
}

impl InMemoryPostRepository {
    pub fn new(members: Arc<dyn MemberDirectory>) -> Self {
        Self {
            table: RwLock::new(PostTable {
                rows: BTreeMap::new(),
                next_post_id: 1,
                next_attachment_id: 1,
            }),
            members,
        }
    }

    async fn page_of<F>(&self, page: PageRequest, matches: F) -> Result<Page<PostSummary>, RepoError>
    where
        F: Fn(&Post) -> bool,
    {
        // Snapshot under the lock, resolve authors after releasing it.
        let (total, rows) = {
            let table = self.table.read().await;
            let mut selected: Vec<&Post> = table.rows.values().filter(|p| matches(p)).collect();
            selected.sort_by_key(|p| Reverse((p.created_at, p.id)));

            let total = selected.len() as u64;
            let rows: Vec<Post> = selected
                .into_iter()
                .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
                .take(page.size() as usize)
                .cloned()
                .collect();
            (total, rows)
        };

        let mut items = Vec::with_capacity(rows.len());
        for post in &rows {
            let username = self
                .members
                .find_member(post.author_id)
                .await?
                .map(|m| m.username)
                .unwrap_or_default();
            items.push(PostSummary::new(post, username));
        }

        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut table = self.table.write().await;

        let id = table.next_post_id;
        table.next_post_id += 1;

        let mut attachments = Vec::with_capacity(new_post.attachments.len());
        for new_attachment in new_post.attachments {
            let attachment_id = table.next_attachment_id;
            table.next_attachment_id += 1;
            attachments.push(Attachment {
                id: attachment_id,
                post_id: id,
                original_name: new_attachment.original_name,
                storage_locator: new_attachment.storage_locator,
            });
        }

        let now = Utc::now();
        let post = Post {
            id,
            author_id: new_post.author_id,
            title: new_post.title,
            body: new_post.body,
            view_count: 0,
            attachments,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_detail(&self, id: PostId) -> Result<Option<PostDetail>, RepoError> {
        let Some(post) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let author = self
            .members
            .find_member(post.author_id)
            .await?
            .ok_or_else(|| RepoError::Query(format!("post {} has no author row", id)))?;

        Ok(Some(PostDetail::new(post, &author)))
    }

    async fn update(&self, post: &Post) -> Result<(), RepoError> {
        let mut table = self.table.write().await;
        let stored = table.rows.get_mut(&post.id).ok_or(RepoError::NotFound)?;

        stored.title = post.title.clone();
        stored.body = post.body.clone();
        stored.updated_at = post.updated_at;
        Ok(())
    }

    async fn increment_view_count(&self, id: PostId) -> Result<bool, RepoError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(post) => {
                post.view_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut table = self.table.write().await;
        // Attachments are owned by the row, so they go with it.
        table.rows.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<PostSummary>, RepoError> {
        self.page_of(page, |_| true).await
    }

    async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        self.page_of(page, |p| p.title.contains(keyword) || p.body.contains(keyword))
            .await
    }

    async fn is_locator_referenced(&self, locator: &str) -> Result<bool, RepoError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .flat_map(|p| p.attachments.iter())
            .any(|a| a.storage_locator == locator))
    }
}
