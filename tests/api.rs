//! HTTP integration tests against the full router with the in-memory store.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so extractors,
//! middleware and error rendering are all exercised. No database needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use startupmatch::auth::session::SessionClaims;
use startupmatch::config::Config;
use startupmatch::models::user::UpsertUser;
use startupmatch::store::memory::MemoryStore;
use startupmatch::store::ContentStore;
use startupmatch::AppState;

// ── Harness ───────────────────────────────────────────────────

struct TestApp {
    state: Arc<AppState>,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(Config::for_tests())
    }

    fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone()).unwrap();
        Self {
            state: Arc::new(state),
            store,
        }
    }

    fn token(&self, sub: &str) -> String {
        self.state
            .sessions
            .issue(&SessionClaims::new(sub, chrono::Duration::hours(1)))
            .unwrap()
    }

    async fn admin(&self, id: &str) -> String {
        self.store
            .upsert_user(UpsertUser {
                id: id.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        self.store.set_admin(id, true).await.unwrap();
        self.token(id)
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = startupmatch::app(self.state.clone())
            .oneshot(req)
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }
}

fn team_post(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Looking for someone to own our landing page",
        "skillsNeeded": ["figma", "css"],
        "timeCommitment": "Part-time",
        "compensationType": "Equity",
        "category": "Design"
    })
}

// ── Moderation flow ───────────────────────────────────────────

mod moderation_flow {
    use super::*;

    /// A post is pending until an admin approves it, then shows up in the
    /// approved listing with a newer modification time.
    #[tokio::test]
    async fn test_need_a_designer_end_to_end() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let admin = app.admin("bob").await;

        let (status, created) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Need a designer")))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["userId"], "alice");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, approved) = app
            .call(Method::GET, "/api/team-posts?status=approved", Some(&alice), None)
            .await;
        assert_eq!(approved, json!([]));

        let (status, updated) = app
            .call(
                Method::PATCH,
                &format!("/api/team-posts/{}", id),
                Some(&admin),
                Some(json!({ "status": "approved" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "approved");

        let (_, approved) = app
            .call(Method::GET, "/api/team-posts?status=approved", Some(&alice), None)
            .await;
        let approved = approved.as_array().unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0]["title"], "Need a designer");

        let before: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(created["updatedAt"].clone()).unwrap();
        let after: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(approved[0]["updatedAt"].clone()).unwrap();
        assert!(after > before);
    }

    /// Client-supplied status, owner and id are ignored on creation.
    #[tokio::test]
    async fn test_create_ignores_client_status() {
        let app = TestApp::new();
        let alice = app.token("alice");

        let mut body = team_post("Sneaky");
        body["status"] = json!("approved");
        body["userId"] = json!("someone-else");

        let (status, created) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["userId"], "alice");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_set_status() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let (_, created) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Mine")))
            .await;
        let uri = format!("/api/team-posts/{}", created["id"].as_str().unwrap());

        let (status, body) = app
            .call(Method::PATCH, &uri, Some(&alice), Some(json!({ "status": "approved" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "Forbidden" }));

        let (_, item) = app.call(Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(item["status"], "pending");
    }

    /// The admin check comes before id parsing, so a malformed id and a
    /// missing one look the same to a non-admin.
    #[tokio::test]
    async fn test_non_admin_gets_403_for_any_id() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let body = json!({ "status": "approved" });

        let (status, _) = app
            .call(Method::PATCH, "/api/team-posts/not-a-uuid", Some(&alice), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/team-posts/{}", uuid::Uuid::new_v4());
        let (status, _) = app.call(Method::PATCH, &uri, Some(&alice), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_status_literal() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let admin = app.admin("bob").await;
        let (_, created) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Mine")))
            .await;
        let uri = format!("/api/team-posts/{}", created["id"].as_str().unwrap());

        for body in [json!({ "status": "archived" }), json!({ "status": 1 }), json!({})] {
            let (status, resp) = app.call(Method::PATCH, &uri, Some(&admin), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp["message"], "Invalid status");
        }

        let (_, item) = app.call(Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(item["status"], "pending");
    }

    #[tokio::test]
    async fn test_set_status_on_missing_item() {
        let app = TestApp::new();
        let admin = app.admin("bob").await;
        let (status, body) = app
            .call(
                Method::PATCH,
                &format!("/api/project-gigs/{}", uuid::Uuid::new_v4()),
                Some(&admin),
                Some(json!({ "status": "rejected" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Project gig not found");
    }

    #[tokio::test]
    async fn test_pending_queue_is_admin_only() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let admin = app.admin("bob").await;
        app.call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Queued")))
            .await;

        let (status, _) = app.call(Method::GET, "/api/admin/pending", Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, queue) = app.call(Method::GET, "/api/admin/pending", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue["teamPosts"].as_array().unwrap().len(), 1);
        assert_eq!(queue["projectGigs"], json!([]));
        assert_eq!(queue["startups"], json!([]));
    }
}

// ── Ownership ─────────────────────────────────────────────────

mod ownership {
    use super::*;

    /// A stranger's delete is refused and the item is untouched.
    #[tokio::test]
    async fn test_non_owner_delete_is_forbidden() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let mallory = app.token("mallory");

        let (_, created) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Keep me")))
            .await;
        let uri = format!("/api/team-posts/{}", created["id"].as_str().unwrap());

        let (status, _) = app.call(Method::DELETE, &uri, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, item) = app.call(Method::GET, &uri, Some(&mallory), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item, created);
    }

    #[tokio::test]
    async fn test_owner_and_admin_can_delete() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let admin = app.admin("bob").await;

        for who in [&alice, &admin] {
            let (_, created) = app
                .call(Method::POST, "/api/team-posts", Some(&alice), Some(team_post("Bye")))
                .await;
            let uri = format!("/api/team-posts/{}", created["id"].as_str().unwrap());

            let (status, _) = app.call(Method::DELETE, &uri, Some(who), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
            let (status, _) = app.call(Method::GET, &uri, Some(&alice), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_profile_edits_are_self_only() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let admin = app.admin("bob").await;
        // sign alice in
        app.call(Method::GET, "/api/auth/user", Some(&alice), None).await;

        let (status, _) = app
            .call(Method::PATCH, "/api/users/alice", Some(&admin), Some(json!({ "major": "Law" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, user) = app
            .call(
                Method::PATCH,
                "/api/users/alice",
                Some(&alice),
                Some(json!({ "major": "CS", "skills": ["rust"], "isAdmin": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["major"], "CS");
        assert_eq!(user["skills"], json!(["rust"]));
        assert_eq!(user["isAdmin"], false);
    }
}

// ── Requests and errors ───────────────────────────────────────

mod requests {
    use super::*;

    #[tokio::test]
    async fn test_missing_or_bad_token_is_401() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/team-posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");

        let (status, _) = app
            .call(Method::GET, "/api/team-posts", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_user() {
        let app = TestApp::new();
        let token = app.token("newcomer");
        let (status, user) = app.call(Method::GET, "/api/auth/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["id"], "newcomer");
        assert_eq!(user["isAdmin"], false);
        assert!(app.store.get_user("newcomer").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_kind_and_bad_id_are_404() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let (status, _) = app.call(Method::GET, "/api/widgets", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .call(Method::GET, "/api/startups/not-a-uuid", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Startup not found");
    }

    #[tokio::test]
    async fn test_validation_errors_list_fields() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let mut body = team_post("x");
        body["title"] = json!("t".repeat(201));
        body["category"] = json!("   ");

        let (status, resp) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Invalid input");
        assert_eq!(resp["errors"].as_array().unwrap().len(), 2);

        let (status, _) = app
            .call(Method::POST, "/api/project-gigs", Some(&alice), Some(json!({ "title": "x" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_json_body_is_413() {
        let mut config = Config::for_tests();
        config.max_upload_bytes = 1024;
        let app = TestApp::with_config(config);
        let alice = app.token("alice");

        let mut body = team_post("Huge");
        body["description"] = json!("x".repeat(2 * 1024 * 1024));
        let (status, resp) = app
            .call(Method::POST, "/api/team-posts", Some(&alice), Some(body))
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp["message"], "Payload too large");
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_status_filter() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let (status, _) = app
            .call(Method::GET, "/api/startups?status=archived", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));

        let (status, _) = app.call(Method::GET, "/metrics", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ── Messages ──────────────────────────────────────────────────

mod messages {
    use super::*;

    #[tokio::test]
    async fn test_message_lifecycle() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let bob = app.token("bob");
        app.call(Method::GET, "/api/auth/user", Some(&bob), None).await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/messages",
                Some(&alice),
                Some(json!({ "receiverId": "ghost", "content": "hello?" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, sent) = app
            .call(
                Method::POST,
                "/api/messages",
                Some(&alice),
                Some(json!({ "receiverId": "bob", "content": "Want to join?" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["senderId"], "alice");
        assert_eq!(sent["read"], false);
        let read_uri = format!("/api/messages/{}/read", sent["id"].as_str().unwrap());

        // the sender cannot mark it read
        let (status, _) = app.call(Method::PATCH, &read_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        for _ in 0..2 {
            let (status, _) = app.call(Method::PATCH, &read_uri, Some(&bob), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (_, inbox) = app.call(Method::GET, "/api/messages", Some(&bob), None).await;
        assert_eq!(inbox[0]["read"], true);
        assert_eq!(inbox[0]["content"], "Want to join?");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let app = TestApp::new();
        let alice = app.token("alice");
        let (status, resp) = app
            .call(
                Method::POST,
                "/api/messages",
                Some(&alice),
                Some(json!({ "receiverId": "alice", "content": "  " })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["errors"][0], "content: required");
    }
}

// ── Startup uploads ───────────────────────────────────────────

mod uploads {
    use super::*;

    const BOUNDARY: &str = "startupmatch-test-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        )
    }

    fn multipart_startup(file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = String::new();
        body.push_str(&text_part("name", "Campus Eats"));
        body.push_str(&text_part("oneLiner", "Dorm food delivery"));
        body.push_str(&text_part("description", "Late-night delivery for students"));
        body.push_str(&text_part("stage", "Idea"));
        body.push_str(&text_part("milestones", r#"["MVP","First 100 users"]"#));
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"logoFile\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, file_name, content_type
        ));
        let mut bytes = body.into_bytes();
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        bytes
    }

    fn multipart_request(token: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/startups")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_startup_with_logo_upload() {
        let app = TestApp::new();
        let alice = app.token("alice");

        let (status, startup) = app
            .send(multipart_request(
                &alice,
                multipart_startup("logo.png", "image/png", b"\x89PNG\r\n"),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(startup["status"], "pending");
        assert_eq!(startup["milestones"], json!(["MVP", "First 100 users"]));

        let logo_url = startup["logoUrl"].as_str().unwrap();
        assert!(logo_url.starts_with("/uploads/logoFile-"));

        let resp = startupmatch::app(app.state.clone())
            .oneshot(Request::builder().uri(logo_url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"\x89PNG\r\n");
    }

    #[tokio::test]
    async fn test_non_image_upload_creates_nothing() {
        let app = TestApp::new();
        let alice = app.token("alice");

        let (status, _) = app
            .send(multipart_request(
                &alice,
                multipart_startup("payload.sh", "text/x-shellscript", b"#!/bin/sh"),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, startups) = app.call(Method::GET, "/api/startups", Some(&alice), None).await;
        assert_eq!(startups, json!([]));
    }

    #[tokio::test]
    async fn test_missing_upload_is_404() {
        let app = TestApp::new();
        let (status, _) = app
            .call(Method::GET, "/uploads/logoFile-nothing.png", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
