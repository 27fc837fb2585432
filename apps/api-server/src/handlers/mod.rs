//! HTTP handlers and route configuration.

mod health;
mod members;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    // Registered before `/{id}` so "search" is never read as an id.
                    .route("/search", web::get().to(posts::search))
                    .route("/{id}", web::get().to(posts::detail))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/members")
                    .route("", web::post().to(members::register))
                    .route("/email/{email}", web::get().to(members::get_by_email))
                    .route("/{id}", web::get().to(members::get)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use board_core::domain::{CreatePost, NewMember, PageRequest};
    use board_infra::InMemoryBinaryStore;

    use super::configure_routes;
    use crate::observability::{REQUEST_ID_HEADER, RequestIdMiddleware};
    use crate::state::AppState;

    const BOUNDARY: &str = "board-test-boundary";

    macro_rules! init_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(RequestIdMiddleware)
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn state_with_limit(max_upload_bytes: usize) -> (AppState, Arc<InMemoryBinaryStore>) {
        let store = Arc::new(InMemoryBinaryStore::new());
        let state = AppState::in_memory(
            store.clone(),
            chrono::Duration::hours(1),
            max_upload_bytes,
        );
        (state, store)
    }

    fn state() -> (AppState, Arc<InMemoryBinaryStore>) {
        state_with_limit(1024 * 1024)
    }

    async fn seed_member(state: &AppState, email: &str) -> i64 {
        state
            .members
            .register(NewMember::new(email, email.split('@').next().unwrap_or(email)))
            .await
            .unwrap()
            .id
    }

    async fn seed_post(state: &AppState, author_id: i64, title: &str) -> i64 {
        state
            .posts
            .create(
                CreatePost {
                    author_id,
                    title: title.to_string(),
                    body: format!("{} body", title),
                },
                vec![],
            )
            .await
            .unwrap()
    }

    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (filename, content_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn create_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_health_carries_request_id() {
        let (state, _) = state();
        let app = init_app!(state);

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_multipart_create_then_detail_counts_views() {
        let (state, store) = state();
        let author = seed_member(&state, "kim@example.com").await;
        let app = init_app!(state);

        let author_field = author.to_string();
        let body = multipart_body(
            &[("title", "Hello"), ("body", "World"), ("authorId", author_field.as_str())],
            &[
                ("cat.png", "image/png", &b"\x89PNG"[..]),
                ("notes.txt", "text/plain", &b"hi"[..]),
            ],
        );
        let res = test::call_service(&app, create_request(body).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(res).await;
        let id = created["data"]["id"].as_i64().unwrap();
        assert_eq!(store.len().await, 2);

        for expected in 1..=2 {
            let req = test::TestRequest::get()
                .uri(&format!("/api/posts/{}", id))
                .to_request();
            let detail: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(detail["data"]["viewCount"], expected);
            assert_eq!(detail["data"]["title"], "Hello");
            assert_eq!(detail["data"]["authorUsername"], "kim");
            assert_eq!(detail["data"]["attachments"].as_array().unwrap().len(), 2);
        }
    }

    #[actix_web::test]
    async fn test_create_with_unknown_author_is_bad_request() {
        let (state, _) = state();
        let app = init_app!(state);

        let body = multipart_body(&[("title", "T"), ("body", "B"), ("authorId", "777")], &[]);
        let res = test::call_service(&app, create_request(body).to_request()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let problem: Value = test::read_body_json(res).await;
        assert_eq!(problem["status"], 400);
    }

    #[actix_web::test]
    async fn test_create_without_author_is_bad_request() {
        let (state, _) = state();
        let app = init_app!(state);

        let body = multipart_body(&[("title", "T"), ("body", "B")], &[]);
        let res = test::call_service(&app, create_request(body).to_request()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let (state, store) = state_with_limit(8);
        let author = seed_member(&state, "kim@example.com").await;
        let app = init_app!(state);

        let author_field = author.to_string();
        let body = multipart_body(
            &[("title", "T"), ("body", "B"), ("authorId", author_field.as_str())],
            &[("big.bin", "application/octet-stream", &[0u8; 64][..])],
        );
        let res = test::call_service(&app, create_request(body).to_request()).await;

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.is_empty().await);
    }

    #[actix_web::test]
    async fn test_too_many_form_parts_is_rejected() {
        let (state, store) = state_with_limit(8);
        let author = seed_member(&state, "kim@example.com").await;
        let app = init_app!(state);

        let author_field = author.to_string();
        let names: Vec<String> = (0..40).map(|i| format!("part{}.bin", i)).collect();
        let files: Vec<(&str, &str, &[u8])> = names
            .iter()
            .map(|name| (name.as_str(), "application/octet-stream", &b"x"[..]))
            .collect();
        let body = multipart_body(
            &[("title", "T"), ("body", "B"), ("authorId", author_field.as_str())],
            &files,
        );
        let res = test::call_service(&app, create_request(body).to_request()).await;

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.is_empty().await);
        let page = state.posts.list_posts(PageRequest::new(0, 10)).await.unwrap();
        assert_eq!(page.total_items, 0);
    }

    #[actix_web::test]
    async fn test_update_is_forbidden_for_strangers_and_missing_posts() {
        let (state, _) = state();
        let author = seed_member(&state, "kim@example.com").await;
        let stranger = seed_member(&state, "lee@example.com").await;
        let id = seed_post(&state, author, "T1").await;
        let app = init_app!(state);

        let update = |post_id: i64, caller: i64| {
            test::TestRequest::put()
                .uri(&format!("/api/posts/{}?callerId={}", post_id, caller))
                .set_json(json!({ "title": "T2", "body": "B2" }))
                .to_request()
        };

        let res = test::call_service(&app, update(id, stranger)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = test::call_service(&app, update(9999, author)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = test::call_service(&app, update(id, author)).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", id))
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["data"]["title"], "T2");
    }

    #[actix_web::test]
    async fn test_update_with_blank_title_is_bad_request() {
        let (state, _) = state();
        let author = seed_member(&state, "kim@example.com").await;
        let id = seed_post(&state, author, "T1").await;
        let app = init_app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}?callerId={}", id, author))
            .set_json(json!({ "title": "", "body": "B2" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_then_detail_is_not_found() {
        let (state, _) = state();
        let author = seed_member(&state, "kim@example.com").await;
        let id = seed_post(&state, author, "T1").await;
        let app = init_app!(state);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}?callerId={}", 9999, author))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}?callerId={}", id, author))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", id))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let problem: Value = test::read_body_json(res).await;
        assert_eq!(problem["title"], "Not Found");
    }

    #[actix_web::test]
    async fn test_list_and_search_pages() {
        let (state, _) = state();
        let author = seed_member(&state, "kim@example.com").await;
        for title in ["Rust one", "Go two", "Rust three"] {
            seed_post(&state, author, title).await;
        }
        let app = init_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/posts?page=0&size=2")
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["data"]["totalItems"], 3);
        assert_eq!(page["data"]["totalPages"], 2);
        assert_eq!(page["data"]["items"][0]["title"], "Rust three");

        let req = test::TestRequest::get()
            .uri("/api/posts/search?keyword=Rust")
            .to_request();
        let hits: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(hits["data"]["totalItems"], 2);

        let req = test::TestRequest::get()
            .uri("/api/posts/search?keyword=")
            .to_request();
        let blank: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(blank["data"]["totalItems"], 0);
        assert_eq!(blank["data"]["totalPages"], 0);
    }

    #[actix_web::test]
    async fn test_member_registration_and_lookup() {
        let (state, _) = state();
        let app = init_app!(state);

        let register = || {
            test::TestRequest::post()
                .uri("/api/members")
                .set_json(json!({ "email": "kim@example.com", "username": "kim" }))
                .to_request()
        };

        let res = test::call_service(&app, register()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(res).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let res = test::call_service(&app, register()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/members/{}", id))
            .to_request();
        let member: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(member["data"]["username"], "kim");

        let req = test::TestRequest::get()
            .uri("/api/members/email/kim@example.com")
            .to_request();
        let member: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(member["data"]["id"], id);

        let req = test::TestRequest::get().uri("/api/members/4242").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
