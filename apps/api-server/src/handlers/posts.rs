//! Post handlers.

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;

use board_core::domain::{
    Attachment, CreatePost, Page, PageRequest, PostDetail, PostSummary, UpdatePost, UploadedFile,
};
use board_shared::ApiResponse;
use board_shared::dto::{
    AttachmentResponse, CallerQuery, CreatedResponse, PageQuery, PageResponse,
    PostDetailResponse, PostSummaryResponse, SearchQuery, UpdatePostRequest,
};

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// GET /api/posts?page=&size=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .list_posts(PageRequest::new(query.page, query.size))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(page_response(page))))
}

/// GET /api/posts/search?keyword=&page=&size=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .search(&query.keyword, PageRequest::new(query.page, query.size))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(page_response(page))))
}

/// GET /api/posts/{id}
///
/// Every successful read counts as a view.
pub async fn detail(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let detail = state.posts.get_detail(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(detail_response(detail))))
}

/// POST /api/posts (multipart: title, body, authorId, files*)
pub async fn create(
    state: web::Data<AppState>,
    request_id: RequestId,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = read_create_form(payload, state.max_upload_bytes).await?;
    tracing::debug!(
        request_id = %request_id.as_str(),
        files = form.files.len(),
        "Create post form received"
    );

    let id = state.posts.create(form.input, form.files).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(CreatedResponse { id })))
}

/// PUT /api/posts/{id}?callerId=
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    caller: web::Query<CallerQuery>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .posts
        .update(
            path.into_inner(),
            UpdatePost {
                title: req.title,
                body: req.body,
            },
            caller.caller_id,
        )
        .await
        .map_err(AppError::for_mutation)?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Post updated")))
}

/// DELETE /api/posts/{id}?callerId=
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    caller: web::Query<CallerQuery>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(path.into_inner(), caller.caller_id)
        .await
        .map_err(AppError::for_mutation)?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted")))
}

// ============================================================================
// Multipart form
// ============================================================================

struct CreateForm {
    input: CreatePost,
    files: Vec<UploadedFile>,
}

/// Upper bound on form parts; with the per-part limit this bounds the buffered request.
const MAX_FORM_PARTS: usize = 32;

async fn read_create_form(mut payload: Multipart, limit: usize) -> AppResult<CreateForm> {
    let mut title = String::new();
    let mut body = String::new();
    let mut author_id = None;
    let mut files = Vec::new();
    let mut parts = 0usize;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        parts += 1;
        if parts > MAX_FORM_PARTS {
            return Err(AppError::PayloadTooLarge(format!(
                "form has more than {} parts",
                MAX_FORM_PARTS
            )));
        }
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => title = read_text(&mut field, limit).await?,
            "body" => body = read_text(&mut field, limit).await?,
            "authorId" => {
                let raw = read_text(&mut field, limit).await?;
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::BadRequest(format!("invalid authorId: {}", raw)))?;
                author_id = Some(id);
            }
            "files" | "file" => {
                let original_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let content_type = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_bytes(&mut field, limit).await?;
                files.push(UploadedFile::new(original_name, content_type, bytes));
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
                read_bytes(&mut field, limit).await?;
            }
        }
    }

    let author_id =
        author_id.ok_or_else(|| AppError::BadRequest("authorId is required".to_string()))?;

    Ok(CreateForm {
        input: CreatePost {
            author_id,
            title,
            body,
        },
        files,
    })
}

async fn read_bytes(field: &mut Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "form part exceeds {} bytes",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: &mut Field, limit: usize) -> AppResult<String> {
    let bytes = read_bytes(field, limit).await?;
    String::from_utf8(bytes).map_err(|_| AppError::BadRequest("form field is not UTF-8".to_string()))
}

fn malformed(e: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("malformed multipart body: {}", e))
}

// ============================================================================
// Response mapping
// ============================================================================

fn summary_response(summary: PostSummary) -> PostSummaryResponse {
    PostSummaryResponse {
        id: summary.id,
        title: summary.title,
        author_username: summary.author_username,
        view_count: summary.view_count,
        created_at: summary.created_at,
    }
}

fn page_response(page: Page<PostSummary>) -> PageResponse<PostSummaryResponse> {
    let page = page.map(summary_response);
    PageResponse {
        items: page.items,
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}

fn attachment_response(attachment: Attachment) -> AttachmentResponse {
    AttachmentResponse {
        id: attachment.id,
        original_name: attachment.original_name,
        storage_locator: attachment.storage_locator,
    }
}

fn detail_response(detail: PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        id: detail.id,
        title: detail.title,
        body: detail.body,
        author_username: detail.author_username,
        author_email: detail.author_email,
        view_count: detail.view_count,
        created_at: detail.created_at,
        updated_at: detail.updated_at,
        attachments: detail
            .attachments
            .into_iter()
            .map(attachment_response)
            .collect(),
    }
}
