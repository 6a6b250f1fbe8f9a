// End-to-end Q&A flow through the HTTP router with a real database.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{bearer, files_under, json_request, multipart_request, send, TestDb};
use forum_api::app;
use forum_api::services::posts::NewPost;

#[tokio::test]
async fn ask_answer_accept_over_http() -> Result<()> {
    let Some(db) = TestDb::create().await? else { return Ok(()) };
    let category = db.category().await?;
    let app = app(db.state());

    for name in ["asker", "helper"] {
        let payload = format!(
            r#"{{"username":"{name}","email":"{name}@example.com","password":"hunter22"}}"#
        );
        let (status, body) = send(&app, json_request("POST", "/api/auth/register", None, &payload)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let mut tokens = Vec::new();
    for name in ["asker", "helper"] {
        let payload = format!(r#"{{"username":"{name}","password":"hunter22"}}"#);
        let (status, body) = send(&app, json_request("POST", "/api/auth/login", None, &payload)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        tokens.push(format!("Bearer {}", body["token"].as_str().unwrap()));
    }
    let (asker, helper) = (&tokens[0], &tokens[1]);

    // New accounts start at zero, so a reward cannot be escrowed yet
    let ask = format!(
        r#"{{"title":"Borrowing in loops","content":"E0499 again","category_id":{category},"reward":10}}"#
    );
    let (status, body) = send(&app, json_request("POST", "/qa/ask", Some(asker), &ask)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_POINTS");

    let ask = format!(
        r#"{{"title":"Borrowing in loops","content":"E0499 again","category":{category},"tags":"borrowck"}}"#
    );
    let (status, body) = send(&app, json_request("POST", "/qa/ask", Some(asker), &ask)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let question_id = body["question_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/answers",
            Some(helper),
            &format!(r#"{{"question_id":{question_id},"content":"Split the borrow."}}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let answer_id = body["answer_id"].as_i64().unwrap();

    let accept = format!("/qa/answer/{answer_id}/accept");
    let (status, body) = send(&app, json_request("POST", &accept, Some(helper), "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = send(&app, json_request("POST", &accept, Some(asker), "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Answer accepted");

    let (status, body) = send(&app, json_request("POST", &accept, Some(asker), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_SOLVED");

    let (status, body) = send(
        &app,
        json_request("GET", &format!("/qa/{question_id}"), None, ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_solved"], true);
    assert_eq!(body["answers"][0]["is_accepted"], true);
    assert_eq!(body["accepted_answer"], "Split the borrow.");

    let (status, body) = send(&app, json_request("GET", "/api/user/me", Some(helper), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 3);
    assert!(body.get("password_hash").is_none());

    db.cleanup().await
}

#[tokio::test]
async fn pages_past_the_end_are_empty() -> Result<()> {
    let Some(db) = TestDb::create().await? else { return Ok(()) };
    let app = app(db.state());

    let (status, body) = send(&app, json_request("GET", "/qa?page=9223372036854775807", None, "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(0));

    let (status, body) = send(&app, json_request("GET", "/api/posts?page=9223372036854775807", None, "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["posts"].as_array().map(Vec::len), Some(0));

    db.cleanup().await
}

#[tokio::test]
async fn post_views_are_counted_after_the_response() -> Result<()> {
    let Some(db) = TestDb::create().await? else { return Ok(()) };
    let state = db.state();
    let author = db.user("author", 0).await?;
    let post_id = state
        .posts()
        .create_post(
            author,
            NewPost {
                title: "Pinning explained".to_string(),
                content: "Self-referential futures.".to_string(),
                category_id: db.category().await?,
                tags: String::new(),
            },
        )
        .await?;
    let app = app(state);

    let (status, body) = send(&app, json_request("GET", &format!("/api/posts/{post_id}"), None, "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], post_id);

    let mut views = 0;
    for _ in 0..50 {
        views = db
            .count(&format!("SELECT view_count FROM posts WHERE id = {post_id}"))
            .await?;
        if views == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(views, 1);

    db.cleanup().await
}

#[tokio::test]
async fn resource_files_follow_their_record() -> Result<()> {
    let Some(db) = TestDb::create().await? else { return Ok(()) };
    let state = db.state();
    let owner = db.user("owner", 0).await?;
    let owner_auth = bearer(&state, owner, "owner");
    let ghost_auth = bearer(&state, 987_654, "ghost");
    let app = app(state);

    let parts: [(&str, Option<&str>, &[u8]); 3] = [
        ("title", None, &b"Async Rust slides"[..]),
        ("description", None, &b"From the meetup"[..]),
        ("files", Some("slides.pdf"), &b"%PDF-1.4"[..]),
    ];

    // The account behind the token is gone, so the insert fails after the files landed
    let (status, body) = send(&app, multipart_request("/api/resources", Some(&ghost_auth), &parts)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
    assert!(files_under(&db.upload_root()).is_empty());

    let (status, body) = send(&app, multipart_request("/api/resources", Some(&owner_auth), &parts)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let resource_id = body["resource_id"].as_i64().unwrap();
    assert_eq!(files_under(&db.upload_root()).len(), 1);

    let uri = format!("/api/user/resources/{resource_id}");
    let (status, body) = send(&app, json_request("DELETE", &uri, Some(&owner_auth), "")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(files_under(&db.upload_root()).is_empty());

    let (status, _) = send(&app, json_request("GET", &format!("/api/resources/{resource_id}"), None, "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    db.cleanup().await
}

#[tokio::test]
async fn avatar_replacement_releases_the_old_file() -> Result<()> {
    let Some(db) = TestDb::create().await? else { return Ok(()) };
    let state = db.state();
    let user = db.user("ferris", 0).await?;
    let auth = bearer(&state, user, "ferris");
    let app = app(state);

    let (status, body) = send(
        &app,
        multipart_request("/api/user/avatar", Some(&auth), &[("avatar", Some("crab.png"), &b"\x89PNG"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first = body["avatar_url"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&first).exists());

    let (status, body) = send(
        &app,
        multipart_request("/api/user/avatar", Some(&auth), &[("avatar", Some("crab2.webp"), &b"RIFF"[..])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let second = body["avatar_url"].as_str().unwrap().to_string();
    assert!(!std::path::Path::new(&first).exists());
    assert!(std::path::Path::new(&second).exists());
    assert_eq!(files_under(&db.upload_root()).len(), 1);

    let (status, body) = send(&app, json_request("GET", "/api/user/me", Some(&auth), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatar"], second.as_str());

    db.cleanup().await
}
