//! Member handlers.

use actix_web::{HttpResponse, web};

use board_core::domain::{Member, NewMember};
use board_shared::ApiResponse;
use board_shared::dto::{MemberResponse, RegisterMemberRequest};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/members
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterMemberRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let member = state
        .members
        .register(NewMember::new(req.email.trim(), req.username.trim()))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(member_response(member))))
}

/// GET /api/members/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let member = state.members.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(member_response(member))))
}

/// GET /api/members/email/{email}
pub async fn get_by_email(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let member = state.members.get_by_email(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(member_response(member))))
}

fn member_response(member: Member) -> MemberResponse {
    MemberResponse {
        id: member.id,
        email: member.email,
        username: member.username,
        created_at: member.created_at,
    }
}
