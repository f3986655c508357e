//! Route definitions
//!
//! Public auth routes, signed-in account routes, the system status route and
//! the admin routes, all under /api/v1. The admin mount point comes from
//! configuration. The flat paths the bundled frontend still calls
//! (`/login`, `/updateToken`, ...) stay as aliases.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{account, admin_logs, admin_users, auth, health, system};
use crate::middleware::record_operation;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_v1_routes(state))
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes(state: &AppState) -> Router<AppState> {
    let admin_path = state.config().app.admin_path.clone();

    Router::new()
        .nest("/public", public_routes())
        .nest("/user", user_routes())
        .route("/system/cleanup-status", get(system::cleanup_status))
        .route(&format!("{admin_path}/dashboard"), get(system::dashboard))
        .merge(admin_user_routes(state, &admin_path))
        .merge(admin_log_routes(&admin_path))
        .merge(legacy_routes())
}

/// Unauthenticated auth routes
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/send-register-code", post(auth::send_register_code))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

/// Signed-in account routes; the code route stays public
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/send-register-code", post(auth::send_register_code))
        .route("/profile", get(account::profile))
        .route("/password", put(account::change_password))
        .route("/routes", get(account::own_menu_routes))
}

/// Flat aliases kept for the bundled frontend
fn legacy_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/updateToken", post(auth::refresh_token))
        .route("/getUserRoutes", get(account::menu_routes))
        .route("/userPage", get(system::user_page))
}

/// Admin user management, recorded in the operation log
fn admin_user_routes(state: &AppState, admin_path: &str) -> Router<AppState> {
    let users = format!("{admin_path}/users");

    Router::new()
        .route(
            &users,
            get(admin_users::list_users).post(admin_users::create_user),
        )
        .route(
            &format!("{users}/:id"),
            get(admin_users::get_user)
                .put(admin_users::update_user)
                .delete(admin_users::delete_user),
        )
        .route(&format!("{users}/:id/status"), put(admin_users::update_status))
        .route(&format!("{users}/:id/password"), put(admin_users::set_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            record_operation,
        ))
}

/// Operation log browsing and cleanup
fn admin_log_routes(admin_path: &str) -> Router<AppState> {
    let logs = format!("{admin_path}/logs");

    Router::new()
        .route(&logs, get(admin_logs::list_logs))
        .route(&format!("{logs}/stats"), get(admin_logs::log_stats))
        .route(&format!("{logs}/clean"), post(admin_logs::clean_logs))
}
