//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};

use board_core::domain::{
    Attachment, Member, NewMember, NewPost, Page, PageRequest, Post, PostDetail, PostId,
    PostSummary,
};
use board_core::error::RepoError;
use board_core::ports::{MemberRepository, PostRepository};

use super::entity::attachment::{self, Entity as AttachmentEntity};
use super::entity::member::{self, Entity as MemberEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// PostgreSQL member repository.
pub type PostgresMemberRepository = PostgresBaseRepository<MemberEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = match local.chars().next() {
            Some(first) if local.len() > 1 => format!("{}***", first),
            _ => "***".to_string(),
        };
        format!("{}{}", masked_local, domain)
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn create(&self, new_member: NewMember) -> Result<Member, RepoError> {
        let now = Utc::now();
        let model = member::ActiveModel {
            id: NotSet,
            email: Set(new_member.email),
            username: Set(new_member.username),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)?;

        Ok(model.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepoError> {
        // Mask email for logging to avoid PII in logs
        tracing::debug!(member_email = %mask_email(email), "Finding member by email");

        let result = MemberEntity::find()
            .filter(member::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

/// Escape `LIKE` metacharacters so the keyword matches literally.
/// PostgreSQL uses backslash as the default escape character.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl PostgresPostRepository {
    async fn load_attachments(&self, post_id: PostId) -> Result<Vec<Attachment>, RepoError> {
        let rows = AttachmentEntity::find()
            .filter(attachment::Column::PostId.eq(post_id))
            .order_by_asc(attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Run a post query newest-first and resolve author usernames in one extra query.
    async fn fetch_summaries(
        &self,
        query: Select<PostEntity>,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let paginator = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .paginate(self.db.as_ref(), page.size());

        let totals = paginator.num_items_and_pages().await.map_err(query_error)?;
        let rows = paginator.fetch_page(page.page()).await.map_err(query_error)?;

        let author_ids: Vec<i64> = rows.iter().map(|row| row.author_id).collect();
        let usernames: HashMap<i64, String> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            MemberEntity::find()
                .filter(member::Column::Id.is_in(author_ids))
                .all(self.db.as_ref())
                .await
                .map_err(query_error)?
                .into_iter()
                .map(|m| (m.id, m.username))
                .collect()
        };

        let items = rows
            .into_iter()
            .map(|row| {
                let username = usernames.get(&row.author_id).cloned().unwrap_or_default();
                let post = row.into_domain(Vec::new());
                PostSummary::new(&post, username)
            })
            .collect();

        Ok(Page::new(items, page, totals.number_of_items))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;
        let now = Utc::now();

        let row = post::ActiveModel {
            id: NotSet,
            title: Set(new_post.title),
            body: Set(new_post.body),
            view_count: Set(0),
            author_id: Set(new_post.author_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        let mut attachments = Vec::with_capacity(new_post.attachments.len());
        for new_attachment in new_post.attachments {
            let saved = attachment::ActiveModel {
                id: NotSet,
                original_name: Set(new_attachment.original_name),
                storage_locator: Set(new_attachment.storage_locator),
                post_id: Set(row.id),
            }
            .insert(&txn)
            .await
            .map_err(write_error)?;
            attachments.push(saved.into());
        }

        txn.commit().await.map_err(query_error)?;
        tracing::debug!(post_id = row.id, "Post row inserted");

        Ok(row.into_domain(attachments))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let Some(row) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        let attachments = self.load_attachments(id).await?;
        Ok(Some(row.into_domain(attachments)))
    }

    async fn find_detail(&self, id: PostId) -> Result<Option<PostDetail>, RepoError> {
        let Some((row, author)) = PostEntity::find_by_id(id)
            .find_also_related(MemberEntity)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        let author: Member = author
            .ok_or_else(|| RepoError::Query(format!("post {} has no author row", id)))?
            .into();
        let attachments = self.load_attachments(id).await?;

        Ok(Some(PostDetail::new(row.into_domain(attachments), &author)))
    }

    async fn update(&self, changes: &Post) -> Result<(), RepoError> {
        let updated_at: sea_orm::prelude::DateTimeWithTimeZone = changes.updated_at.into();
        let result = PostEntity::update_many()
            .col_expr(post::Column::Title, Expr::value(changes.title.clone()))
            .col_expr(post::Column::Body, Expr::value(changes.body.clone()))
            .col_expr(post::Column::UpdatedAt, Expr::value(updated_at))
            .filter(post::Column::Id.eq(changes.id))
            .exec(self.db.as_ref())
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn increment_view_count(&self, id: PostId) -> Result<bool, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;

        let removed = AttachmentEntity::delete_many()
            .filter(attachment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_error)?;

        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(query_error)?;
        tracing::debug!(
            post_id = id,
            attachment_rows = removed.rows_affected,
            "Post rows deleted"
        );
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<PostSummary>, RepoError> {
        self.fetch_summaries(PostEntity::find(), page).await
    }

    async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let pattern = like_pattern(keyword);
        let query = PostEntity::find().filter(
            Condition::any()
                .add(post::Column::Title.like(pattern.as_str()))
                .add(post::Column::Body.like(pattern.as_str())),
        );

        self.fetch_summaries(query, page).await
    }

    async fn is_locator_referenced(&self, locator: &str) -> Result<bool, RepoError> {
        let count = AttachmentEntity::find()
            .filter(attachment::Column::StorageLocator.eq(locator))
            .count(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("no-at-sign"), "***");
    }
}
