mod config;
mod routes;
mod state;

use std::sync::Arc;

use portal::directory::MockDirectory;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");
    let port = config.port;
    tracing::info!(
        cookie_secure = config.cookie_secure,
        login_delay_ms = %config.login_delay.as_millis(),
        policy = ?config.password_policy,
        max_pose_studios = config.max_pose_studios,
        "configuration loaded"
    );

    let state = state::AppState::new(config, Arc::new(MockDirectory::new()));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "kinetic portal listening");
    axum::serve(listener, app).await.expect("server failed");
}
