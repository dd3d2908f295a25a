use std::net::SocketAddr;
use anyhow::Context;
use tokio::net::TcpListener;
use session_gate::build_app;
use session_gate::shared::config::Config;
use session_gate::shared::database::Database;
use session_gate::shared::services::AppState;
use session_gate::shared::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일은 선택 사항
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    // DB 연결
    let db = Database::new(&config.database_url, config.database_max_connections, config.store_timeout)
        .await?;
    db.initialize().await?;

    // AppState 생성 (모든 Service 초기화)
    let app_state = AppState::new(db, &config);

    let cleanup = app_state.cleanup_scheduler(&config).map(|scheduler| {
        tracing::info!(interval = ?config.cleanup_interval, "cleanup scheduler started");
        scheduler.start()
    });

    let app = build_app(app_state, &config);

    // 서버 시작
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "server listening");
    tracing::info!("Swagger UI available at http://{}/api", config.bind_addr);

    // 서버 실행 (rate limiter 가 클라이언트 주소를 알 수 있도록 ConnectInfo 포함)
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = cleanup {
        handle.abort();
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 수신 시 완료
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
