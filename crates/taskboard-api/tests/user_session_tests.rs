//! Registration, login cookies, refresh, logout and the bot service calls.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use taskboard_types::notify::NoticeKind;

mod common;

use common::{body_json, create_test_app, find_cookie, json_request, set_cookie_headers};

#[tokio::test]
async fn register_returns_profile_without_secrets() {
    let app = create_test_app();

    let (status, body) = app
        .call(
            "POST",
            "/user/register",
            None,
            Some(json!({ "username": "alice", "password": "pw", "tg_name": "ali" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["tg_name"], "ali");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn register_validation_and_conflicts() {
    let app = create_test_app();

    let (status, body) = app
        .call("POST", "/user/register", None, Some(json!({ "username": "  ", "password": "pw" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app
        .call("POST", "/user/register", None, Some(json!({ "username": "a", "password": "pw", "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.signup("alice").await;
    let (status, body) = app
        .call("POST", "/user/register", None, Some(json!({ "username": "alice", "password": "x" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn bad_credentials_and_unknown_user_look_the_same() {
    let app = create_test_app();
    app.signup("alice").await;

    let (wrong_pw, wrong_body) = app
        .call("POST", "/user/login", None, Some(json!({ "username": "alice", "password": "nope" })))
        .await;
    let (unknown, unknown_body) = app
        .call("POST", "/user/login", None, Some(json!({ "username": "bob", "password": "pw" })))
        .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert!(wrong_body.get("details").is_none());
}

#[tokio::test]
async fn login_sets_http_only_session_cookies() {
    let app = create_test_app();
    app.signup("alice").await;

    let response = app
        .send(json_request(
            "POST",
            "/user/login",
            None,
            Some(json!({ "username": "alice", "password": "pw" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    for name in ["access_token", "refresh_token"] {
        let cookie = find_cookie(&cookies, name);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
    }
    assert!(find_cookie(&cookies, "access_token").contains("Max-Age=900"));
}

#[tokio::test]
async fn protected_routes_need_a_valid_access_token() {
    let app = create_test_app();
    let (_, token) = app.signup("alice").await;

    let (status, _) = app.call("GET", "/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/user", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call("GET", "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn access_cookie_is_accepted_without_header() {
    let app = create_test_app();
    let (_, token) = app.signup("alice").await;

    let request = Request::builder()
        .uri("/user")
        .header(header::COOKIE, format!("access_token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let app = create_test_app();
    app.signup("alice").await;

    let login = app
        .send(json_request(
            "POST",
            "/user/login",
            None,
            Some(json!({ "username": "alice", "password": "pw" })),
        ))
        .await;
    let cookies = set_cookie_headers(&login);
    let refresh_cookie = find_cookie(&cookies, "refresh_token");
    let refresh_pair = refresh_cookie.split(';').next().unwrap().to_string();
    let access = body_json(login).await["access_token"].as_str().unwrap().to_string();

    // Refresh via cookie works while the session is live.
    let refresh_request = || {
        Request::builder()
            .method("POST")
            .uri("/user/refresh")
            .header(header::COOKIE, refresh_pair.clone())
            .body(Body::empty())
            .unwrap()
    };
    let response = app.send(refresh_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["access_token"].is_string());

    // Logout clears both cookies and the stored refresh token.
    let response = app.send(json_request("DELETE", "/user/logout", Some(&access), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = set_cookie_headers(&response);
    assert!(find_cookie(&cleared, "access_token").contains("Max-Age=0"));
    assert!(find_cookie(&cleared, "refresh_token").contains("Max-Age=0"));

    let response = app.send(refresh_request()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The access token issued before logout keeps working until it expires.
    let (status, _) = app.call("GET", "/user", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_accepts_token_in_body() {
    let app = create_test_app();
    app.signup("alice").await;

    let login = app
        .send(json_request(
            "POST",
            "/user/login",
            None,
            Some(json!({ "username": "alice", "password": "pw" })),
        ))
        .await;
    let cookie = find_cookie(&set_cookie_headers(&login), "refresh_token");
    let token = cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("refresh_token=")
        .to_string();

    let (status, _) = app
        .call("POST", "/user/refresh", None, Some(json!({ "refresh_token": token })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("POST", "/user/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_chat_id_links_by_tg_name_or_username() {
    let app = create_test_app();
    let (alice, _) = app.signup("alice").await;

    let (status, body) = app
        .call("POST", "/add-chat-id", None, Some(json!({ "tg_name": "alice_tg", "chat_id": 77 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], alice);
    assert_eq!(body["chat_id"], 77);

    let (status, _) = app
        .call("POST", "/add-chat-id", None, Some(json!({ "tg_name": "alice", "chat_id": 77 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call("POST", "/add-chat-id", None, Some(json!({ "tg_name": "mallory", "chat_id": 1 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn send_tasks_pushes_an_on_demand_digest() {
    let app = create_test_app();
    app.signup("alice").await;

    let (status, _) = app
        .call("POST", "/add-chat-id", None, Some(json!({ "tg_name": "alice_tg", "chat_id": 5 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call("POST", "/send-tasks", None, Some(json!({ "tg_name": "alice_tg", "chat_id": 5 })))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    for _ in 0..100 {
        if app.notifier.sent.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let sent = app.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], (NoticeKind::Digest, 5, "You have no open tasks.".to_string()));
    assert_eq!(sent[1].2, "You have no tasks completed today.");

    let (status, _) = app
        .call("POST", "/send-tasks", None, Some(json!({ "tg_name": "ghost", "chat_id": 5 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn send_tasks_never_reaches_a_chat_the_user_has_not_linked() {
    let app = create_test_app();
    let (_, token) = app.signup("alice").await;
    app.signup("bob").await;

    let (status, board) = app
        .call("POST", "/boards", Some(&token), Some(json!({ "name": "Private" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "title": "secret plan", "board_id": board["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Not linked at all yet.
    let (status, _) = app
        .call("POST", "/send-tasks", None, Some(json!({ "tg_name": "alice_tg", "chat_id": 666 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Linked, but to a different chat than the one asked for.
    let (status, _) = app
        .call("POST", "/add-chat-id", None, Some(json!({ "tg_name": "alice_tg", "chat_id": 5 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call("POST", "/send-tasks", None, Some(json!({ "tg_name": "alice", "chat_id": 666 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let sent = app.notifier.sent.lock().unwrap().clone();
    assert!(sent.iter().all(|(_, chat_id, _)| *chat_id != 666), "leaked: {sent:?}");
}

#[tokio::test]
async fn health_is_public() {
    let app = create_test_app();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
