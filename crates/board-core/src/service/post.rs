//! Post lifecycle orchestration.
//!
//! Coordinates the post repository, the member directory and the binary store.
//! Rows and blobs are never written atomically together:
//!
//! - `create` stores every blob first and inserts the rows last, so a storage
//!   failure leaves no row behind but may orphan blobs stored earlier in the
//!   same request. Orphans are logged and left for [`super::OrphanSweeper`].
//! - `delete` removes blobs first and the rows last, so a storage failure
//!   leaves the post intact.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    CreatePost, MemberId, NewAttachment, NewPost, Page, PageRequest, Post, PostDetail, PostId,
    PostSummary, UpdatePost, UploadedFile,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{BinaryStore, MemberDirectory, PostRepository};

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    members: Arc<dyn MemberDirectory>,
    store: Arc<dyn BinaryStore>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        members: Arc<dyn MemberDirectory>,
        store: Arc<dyn BinaryStore>,
    ) -> Self {
        Self {
            posts,
            members,
            store,
        }
    }

    /// Page through all posts, newest first.
    pub async fn list_posts(&self, page: PageRequest) -> Result<Page<PostSummary>, DomainError> {
        Ok(self.posts.list(page).await?)
    }

    /// Return the full post and count the read.
    pub async fn get_detail(&self, id: PostId) -> Result<PostDetail, DomainError> {
        if !self.posts.increment_view_count(id).await? {
            return Err(DomainError::not_found("post", id));
        }

        self.posts
            .find_detail(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    /// Create a post with its attachments and return the new id.
    pub async fn create(
        &self,
        input: CreatePost,
        files: Vec<UploadedFile>,
    ) -> Result<PostId, DomainError> {
        let author = self
            .members
            .find_member(input.author_id)
            .await?
            .ok_or(DomainError::InvalidReference {
                entity_type: "member",
                id: input.author_id,
            })?;

        validate_content(&input.title, &input.body)?;

        let mut attachments = Vec::with_capacity(files.len());
        for file in files.into_iter().filter(|f| !f.is_empty()) {
            let locator = match self.store.store(&file.bytes, &file.original_name).await {
                Ok(locator) => locator,
                Err(e) => {
                    log_orphans(&attachments, "blob storage failed");
                    return Err(e.into());
                }
            };

            if file.is_image() {
                if let Err(e) = self.store.derive_thumbnail(&locator).await {
                    tracing::warn!(locator = %locator, error = %e, "Thumbnail derivation failed");
                }
            }

            attachments.push(NewAttachment {
                original_name: file.original_name,
                storage_locator: locator,
            });
        }

        let attachment_count = attachments.len();
        let new_post = NewPost {
            author_id: author.id,
            title: input.title,
            body: input.body,
            attachments,
        };

        let post = match self.posts.insert(new_post.clone()).await {
            Ok(post) => post,
            Err(e) => {
                log_orphans(&new_post.attachments, "post insert failed");
                return Err(e.into());
            }
        };

        tracing::info!(
            post_id = post.id,
            author_id = author.id,
            attachments = attachment_count,
            "Post created"
        );
        Ok(post.id)
    }

    /// Replace the title and body. Only the author may do this.
    pub async fn update(
        &self,
        id: PostId,
        input: UpdatePost,
        caller_id: MemberId,
    ) -> Result<(), DomainError> {
        let mut post = self.load_owned(id, caller_id).await?;

        validate_content(&input.title, &input.body)?;

        post.title = input.title;
        post.body = input.body;
        post.updated_at = Utc::now();

        match self.posts.update(&post).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(DomainError::not_found("post", id)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(post_id = id, "Post updated");
        Ok(())
    }

    /// Delete the post, its attachment rows and their stored blobs.
    pub async fn delete(&self, id: PostId, caller_id: MemberId) -> Result<(), DomainError> {
        let post = self.load_owned(id, caller_id).await?;

        for attachment in &post.attachments {
            if let Err(e) = self.store.delete(&attachment.storage_locator).await {
                tracing::warn!(
                    post_id = id,
                    locator = %attachment.storage_locator,
                    error = %e,
                    "Blob removal failed, post left intact"
                );
                return Err(e.into());
            }
        }

        match self.posts.delete(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(DomainError::not_found("post", id)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            post_id = id,
            attachments = post.attachments.len(),
            "Post deleted"
        );
        Ok(())
    }

    /// Case-sensitive substring search on title or body, newest first.
    ///
    /// A blank keyword matches nothing.
    pub async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, DomainError> {
        if keyword.trim().is_empty() {
            return Ok(Page::empty(page));
        }

        Ok(self.posts.search(keyword, page).await?)
    }

    async fn load_owned(&self, id: PostId, caller_id: MemberId) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;

        if !post.is_authored_by(caller_id) {
            tracing::debug!(post_id = id, caller_id, "Rejected non-author mutation");
            return Err(DomainError::Forbidden);
        }

        Ok(post)
    }
}

fn validate_content(title: &str, body: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::InvalidInput("title must not be empty".to_string()));
    }
    if body.trim().is_empty() {
        return Err(DomainError::InvalidInput("body must not be empty".to_string()));
    }
    Ok(())
}

fn log_orphans(attachments: &[NewAttachment], reason: &str) {
    if attachments.is_empty() {
        return;
    }
    let locators: Vec<&str> = attachments
        .iter()
        .map(|a| a.storage_locator.as_str())
        .collect();
    tracing::warn!(orphaned = ?locators, reason, "Stored blobs left without a post");
}
