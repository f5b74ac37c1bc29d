mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use lumen_backend::build_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    build_router(common::test_state(None).await)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body should be readable");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_and_formats() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "provider": false}));

    let (_, body) = call(&app, Method::GET, "/api/v1/formats", None).await;
    assert_eq!(body, json!(["chat", "visual", "ebook", "video"]));
}

#[tokio::test]
async fn learn_serves_fallback_without_provider() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/learn",
        Some(json!({"topic": "photosynthesis", "level": "beginner", "format": "ebook"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("<h2>Chapter Overview</h2>\n\nPhotosynthesis"));
    assert!(content.contains("<li>Core concept explained</li>"));
    assert_eq!(body["level"], "primary");
    assert_eq!(body["format"], "ebook");
}

#[tokio::test]
async fn learn_rejects_bad_input() {
    let app = app().await;
    let (status, body) = call(&app, Method::POST, "/api/v1/learn", Some(json!({"topic": "Cells", "level": "wizard"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Unknown level: wizard"}));

    let (status, body) = call(&app, Method::POST, "/api/v1/learn", Some(json!({"topic": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Topic is required");
}

#[tokio::test]
async fn challenge_round_trip_updates_stats() {
    let app = app().await;
    let (status, ch) = call(&app, Method::GET, "/api/v1/game/challenge?difficulty=primary&category=Programming", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ch["id"], "seed-prog-1");
    assert!(ch.get("correct_answer").is_none());

    let (status, out) = call(
        &app,
        Method::POST,
        "/api/v1/game/answer",
        Some(json!({"userId": "alice", "challengeId": "seed-prog-1", "answer": "DEF", "timeTaken": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        out,
        json!({"success": true, "is_correct": true, "points_earned": 10, "correct_answer": "def", "message": "Correct! Great job!"})
    );

    let (_, stats) = call(&app, Method::GET, "/api/v1/game/stats?userId=alice", None).await;
    assert_eq!(stats["total_points"], 10);
    assert_eq!(stats["current_streak"], 1);

    let (_, board) = call(&app, Method::GET, "/api/v1/game/leaderboard", None).await;
    assert_eq!(board["leaderboard"][0]["user_id"], "alice***");

    let (_, cats) = call(&app, Method::GET, "/api/v1/game/categories", None).await;
    assert_eq!(cats["categories"], json!(["Chemistry", "Mathematics", "Physics", "Programming"]));
}

#[tokio::test]
async fn unknown_challenge_is_404() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/game/answer",
        Some(json!({"userId": "alice", "challengeId": "missing", "answer": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Challenge not found"}));
}

#[tokio::test]
async fn community_upvotes_once() {
    let app = app().await;
    let (status, sub) = call(
        &app,
        Method::POST,
        "/api/v1/community/explanations",
        Some(json!({"userId": "alice", "topic": "Gravity", "transcript": "Mass pulls on mass."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["clarity_score"], 5);
    let id = sub["explanation_id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/community/explanations/{id}/upvote");
    let (_, first) = call(&app, Method::POST, &uri, Some(json!({"userId": "bob"}))).await;
    assert_eq!(first["success"], true);
    let (status, again) = call(&app, Method::POST, &uri, Some(json!({"userId": "bob"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, json!({"success": false, "message": "You already upvoted this explanation!"}));

    let (_, listed) = call(&app, Method::GET, "/api/v1/community/explanations?topic=grav", None).await;
    assert_eq!(listed["explanations"][0]["upvotes"], 1);

    let (_, stats) = call(&app, Method::GET, "/api/v1/community/stats?userId=alice", None).await;
    assert_eq!(stats["total_points"], 5);
    assert_eq!(stats["can_redeem_bonus_ai"], false);
}

#[tokio::test]
async fn forum_threads_and_replies() {
    let app = app().await;
    let (status, thread) = call(
        &app,
        Method::POST,
        "/api/v1/forum/threads",
        Some(json!({"userId": "alice", "title": "Study tips?", "body": "How do you revise?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = thread["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/forum/threads/{id}/replies"),
        Some(json!({"userId": "bob", "body": "Flashcards every day."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, full) = call(&app, Method::GET, &format!("/api/v1/forum/threads/{id}"), None).await;
    assert_eq!(full["thread"]["reply_count"], 1);
    assert_eq!(full["replies"][0]["body"], "Flashcards every day.");

    let (_, list) = call(&app, Method::GET, "/api/v1/forum/threads?limit=5", None).await;
    assert_eq!(list["threads"].as_array().map(Vec::len), Some(1));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/forum/threads/missing/replies",
        Some(json!({"userId": "bob", "body": "Hello?"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/forum/threads",
        Some(json!({"userId": "alice", "title": "", "body": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/game/answer",
        Some(json!({"userId": "alice", "challengeId": "seed-prog-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("answer")));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/game/answer",
        Some(json!({"userId": "alice", "challengeId": "seed-prog-1", "answer": "def", "timeTaken": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/v1/game/stats", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/v1/forum/threads?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_categories_do_not_grow_the_catalogue() {
    let app = app().await;
    for i in 0..3 {
        let (status, ch) = call(&app, Method::GET, &format!("/api/v1/game/challenge?difficulty=degree&category=junk{i}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ch["source"], "placeholder");
    }
    let (_, again) = call(&app, Method::GET, "/api/v1/game/challenge?difficulty=degree&category=junk0", None).await;
    assert_eq!(again["id"], "placeholder-degree-junk0");

    let (_, cats) = call(&app, Method::GET, "/api/v1/game/categories", None).await;
    assert_eq!(cats["categories"], json!(["Chemistry", "Mathematics", "Physics", "Programming"]));

    let long = "a".repeat(101);
    let (status, body) = call(&app, Method::GET, &format!("/api/v1/game/challenge?category={long}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
