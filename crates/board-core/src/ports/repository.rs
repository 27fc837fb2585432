use async_trait::async_trait;

use crate::domain::{
    Member, MemberId, NewMember, NewPost, Page, PageRequest, Post, PostDetail, PostId,
    PostSummary,
};
use crate::error::RepoError;

/// Generic repository trait for lookups by primary key.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// Member repository with domain-specific methods.
#[async_trait]
pub trait MemberRepository: BaseRepository<Member, MemberId> {
    /// Insert a new member; a duplicate email is a `Constraint` error.
    async fn create(&self, member: NewMember) -> Result<Member, RepoError>;

    /// Find a member by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepoError>;
}

/// Resolves member references for the post lifecycle.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_member(&self, id: MemberId) -> Result<Option<Member>, RepoError>;
}

#[async_trait]
impl<R> MemberDirectory for R
where
    R: MemberRepository,
{
    async fn find_member(&self, id: MemberId) -> Result<Option<Member>, RepoError> {
        self.find_by_id(id).await
    }
}

/// Post repository. Every method is its own unit of work.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert the post and all of its attachments in one transaction.
    async fn insert(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Load a post with its attachments, ordered by attachment id.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError>;

    /// Load a post with its attachments and author.
    async fn find_detail(&self, id: PostId) -> Result<Option<PostDetail>, RepoError>;

    /// Persist title, body and `updated_at`. Leaves the view counter alone.
    async fn update(&self, post: &Post) -> Result<(), RepoError>;

    /// Add one to the view counter without a read-modify-write race.
    /// Returns `false` when the post does not exist.
    async fn increment_view_count(&self, id: PostId) -> Result<bool, RepoError>;

    /// Delete attachment rows, then the post row.
    async fn delete(&self, id: PostId) -> Result<(), RepoError>;

    /// Newest first; ties broken by id descending.
    async fn list(&self, page: PageRequest) -> Result<Page<PostSummary>, RepoError>;

    /// Case-sensitive substring match on title or body, ordered as `list`.
    async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError>;

    /// Whether any attachment row still points at `locator`.
    async fn is_locator_referenced(&self, locator: &str) -> Result<bool, RepoError>;
}
