//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variables: DATABASE_URL, JWT_SECRET
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const REGISTERED: &str = "User registered successfully";
const RESET_REQUESTED: &str = "If the email exists, a reset code has been sent";

/// Request a code, register with it and log in
async fn register_and_login(server: &TestServer, identity: &Identity) -> LoginResponse {
    let response = server
        .post("/api/v1/public/send-register-code", &identity.send_code())
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let code = server.latest_code(&identity.email, "register").await.unwrap();
    let response = server
        .post("/api/v1/public/register", &identity.register(&code))
        .await
        .unwrap();
    let message: MessageResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(message.message, REGISTERED);

    let response = server
        .post("/api/v1/public/login", &identity.login())
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Registration and Login Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_login() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let identity = Identity::unique();
    let login = register_and_login(&server, &identity).await;

    assert_eq!(login.user_name, identity.username);
    assert_eq!(login.email, identity.email);
    assert_eq!(login.role, vec!["user".to_string()]);
    assert!(!login.access_token.is_empty());
    assert!(login.expires_at > 0);

    // Email works as the identifier too
    let response = server
        .post(
            "/api/v1/public/login",
            &json!({"userName": identity.email, "password": identity.password}),
        )
        .await
        .unwrap();
    let again: LoginResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(again.id, login.id);
}

#[tokio::test]
async fn test_register_code_is_single_use() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let identity = Identity::unique();
    server
        .post("/api/v1/public/send-register-code", &identity.send_code())
        .await
        .unwrap();
    let code = server.latest_code(&identity.email, "register").await.unwrap();

    let response = server
        .post("/api/v1/public/register", &identity.register(&code))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let mut second = identity.register(&code);
    second.username = format!("{}_b", identity.username);
    let response = server.post("/api/v1/public/register", &second).await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let identity = Identity::unique();

    let response = server
        .post("/api/v1/public/login", &identity.login())
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body.error.message, "Invalid account or password");
}

#[tokio::test]
async fn test_refresh_token() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login = register_and_login(&server, &Identity::unique()).await;

    let response = server
        .post(
            "/api/v1/public/refresh-token",
            &json!({"refreshToken": login.refresh_token}),
        )
        .await
        .unwrap();
    let tokens: TokenResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());

    // An access token is not accepted for refresh
    let response = server
        .post(
            "/api/v1/public/refresh-token",
            &json!({"refreshToken": login.access_token}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

// ============================================================================
// Password Reset Tests
// ============================================================================

#[tokio::test]
async fn test_password_reset_flow() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let identity = Identity::unique();
    register_and_login(&server, &identity).await;

    let response = server
        .post(
            "/api/v1/public/forgot-password",
            &json!({"email": identity.email}),
        )
        .await
        .unwrap();
    let message: MessageResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(message.message, RESET_REQUESTED);

    // The reset mail goes out in the background
    let mut code = None;
    for _ in 0..50 {
        if let Ok(found) = server.latest_code(&identity.email, "reset_password").await {
            code = Some(found);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    let code = code.expect("reset code was not issued");

    let response = server
        .post(
            "/api/v1/public/reset-password",
            &ResetPasswordRequest {
                email: identity.email.clone(),
                code,
                new_password: "BrandNew456!".to_string(),
            },
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(
            "/api/v1/public/login",
            &json!({"userName": identity.username, "password": "BrandNew456!"}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let identity = Identity::unique();
    let response = server
        .post(
            "/api/v1/public/forgot-password",
            &json!({"email": identity.email}),
        )
        .await
        .unwrap();
    let message: MessageResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(message.message, RESET_REQUESTED);
}

// ============================================================================
// Admin Tests
// ============================================================================

#[tokio::test]
async fn test_admin_requires_admin_role() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login = register_and_login(&server, &Identity::unique()).await;

    let response = server.get("/api/v1/admin/users").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .get_auth("/api/v1/admin/users", &login.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_admin_user_lifecycle() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login = register_and_login(&server, &Identity::unique()).await;
    let token = server.admin_token(login.id).unwrap();
    let target = Identity::unique();

    let response = server
        .post_auth(
            "/api/v1/admin/users",
            &token,
            &json!({
                "username": target.username,
                "password": target.password,
                "email": target.email,
            }),
        )
        .await
        .unwrap();
    let created: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["role"], "user");

    let response = server
        .get_auth(
            &format!("/api/v1/admin/users?keyword={}", target.username),
            &token,
        )
        .await
        .unwrap();
    let page: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(page["total"], 1);

    // Disabled accounts cannot log in
    let response = server
        .put_auth(
            &format!("/api/v1/admin/users/{id}/status"),
            &token,
            &json!({"status": 0}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    let response = server
        .post("/api/v1/public/login", &target.login())
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let response = server
        .delete_auth(&format!("/api/v1/admin/users/{id}"), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    let response = server
        .get_auth(&format!("/api/v1/admin/users/{id}"), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_operation_log_stats() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login = register_and_login(&server, &Identity::unique()).await;
    let token = server.admin_token(login.id).unwrap();

    let response = server
        .get_auth("/api/v1/admin/logs/stats", &token)
        .await
        .unwrap();
    let stats: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(stats["total_count"].as_i64().is_some());
    assert!(stats["module_stats"].is_array());
}

#[tokio::test]
async fn test_cleanup_status() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login = register_and_login(&server, &Identity::unique()).await;

    let response = server
        .get_auth("/api/v1/system/cleanup-status", &login.access_token)
        .await
        .unwrap();
    let status: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(status["interval_minutes"].as_u64().is_some());
}
