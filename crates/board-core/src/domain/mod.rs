//! Domain entities - the core business objects.

mod member;
mod page;
mod post;

pub use member::{Member, MemberId, NewMember};
pub use page::{Page, PageRequest};
pub use post::{
    Attachment, AttachmentId, CreatePost, NewAttachment, NewPost, Post, PostDetail, PostId,
    PostSummary, UpdatePost, UploadedFile,
};
