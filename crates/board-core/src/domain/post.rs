use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::member::{Member, MemberId};

/// Post identifier.
pub type PostId = i64;

/// Attachment identifier.
pub type AttachmentId = i64;

/// Post aggregate - a titled text submission that owns its attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: MemberId,
    pub title: String,
    pub body: String,
    pub view_count: i64,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_authored_by(&self, member_id: MemberId) -> bool {
        self.author_id == member_id
    }
}

/// One stored image tied to exactly one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub post_id: PostId,
    /// Client-supplied file name, possibly empty.
    pub original_name: String,
    /// Opaque key returned by the binary store.
    pub storage_locator: String,
}

/// A post about to be inserted together with its attachments.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: MemberId,
    pub title: String,
    pub body: String,
    pub attachments: Vec<NewAttachment>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub original_name: String,
    pub storage_locator: String,
}

/// Listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub author_username: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    pub fn new(post: &Post, author_username: impl Into<String>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            author_username: author_username.into(),
            view_count: post.view_count,
            created_at: post.created_at,
        }
    }
}

/// Full post view with author details and attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author_username: String,
    pub author_email: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

impl PostDetail {
    pub fn new(post: Post, author: &Member) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            author_username: author.username.clone(),
            author_email: author.email.clone(),
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            attachments: post.attachments,
        }
    }
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author_id: MemberId,
    pub title: String,
    pub body: String,
}

/// Replacement title and body for an existing post.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub title: String,
    pub body: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// A file received from a client upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        original_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether a thumbnail should be derived for this upload.
    ///
    /// Trusts the declared content type; falls back to the file extension
    /// when the client sent none.
    pub fn is_image(&self) -> bool {
        match &self.content_type {
            Some(content_type) => content_type.starts_with("image/"),
            None => Path::new(&self.original_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
                .unwrap_or(false),
        }
    }
}
