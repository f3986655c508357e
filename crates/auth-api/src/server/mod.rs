//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use auth_common::{AppConfig, AppError, JwtService};
use auth_db::{
    create_pool, pool::run_migrations_from, PgAccountRepository, PgCredentialRepository,
    PgEmailLogRepository, PgEmailTemplateRepository, PgOperationLogRepository,
    PgVerificationCodeRepository, PoolSettings,
};
use auth_service::services::{transport_from_config, verifier_from_config};
use auth_service::{CodeSweeper, ServiceContext};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::middleware::{apply_middleware, apply_rate_limit};
use crate::response::set_expose_error_details;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
///
/// Rate limiting is added by [`run`], since it keys on the peer address.
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let router = create_router(&state);
    let router = apply_middleware(router, &config.cors, config.app.env.is_production());
    router.with_state(state)
}

/// Directory the migrations are read from; `MIGRATIONS_DIR` overrides the built-in one
fn migrations_dir() -> PathBuf {
    std::env::var_os("MIGRATIONS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(auth_db::pool::MIGRATIONS_DIR))
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    // Create database pool
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolSettings::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    run_migrations_from(&pool, &migrations_dir())
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {e}")))?;

    // Create JWT service
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));

    let mail_transport = transport_from_config(&config.mail, &config.app.name);
    if mail_transport.is_none() {
        warn!("No mail transport configured; code mail will be refused");
    }
    let human_verifier = verifier_from_config(&config.captcha);
    if human_verifier.is_none() {
        info!("Captcha verification disabled");
    }

    // Build service context
    let service_context = ServiceContext::builder()
        .account_repo(Arc::new(PgAccountRepository::new(pool.clone())))
        .code_repo(Arc::new(PgVerificationCodeRepository::new(pool.clone())))
        .credential_repo(Arc::new(PgCredentialRepository::new(pool.clone())))
        .operation_log_repo(Arc::new(PgOperationLogRepository::new(pool.clone())))
        .email_template_repo(Arc::new(PgEmailTemplateRepository::new(pool.clone())))
        .email_log_repo(Arc::new(PgEmailLogRepository::new(pool.clone())))
        .mail_transport(mail_transport)
        .human_verifier(human_verifier)
        .jwt_service(jwt_service)
        .config(Arc::new(config))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context).with_pool(pool))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    set_expose_error_details(!config.app.env.is_production());
    let addr = config.api.address();
    let rate_limit = config.rate_limit.clone();

    // Create app state
    let state = create_app_state(config).await?;

    // Background code sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = CodeSweeper::new(state.service_context().clone()).spawn(shutdown_rx);

    // Build application
    let config = state.config();
    let router = apply_middleware(
        create_router(&state),
        &config.cors,
        config.app.env.is_production(),
    );
    // Rate limiting outermost, applied first to incoming requests
    let app = apply_rate_limit(router, &rate_limit).with_state(state.clone());

    let result = run_server(app, &addr).await;

    // Stop the sweeper before returning
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Code sweeper task ended abnormally");
    }

    result
}
