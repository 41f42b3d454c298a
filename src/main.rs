// ==========================================
// 待打包订单发运系统 - 服务入口
// ==========================================
// 技术栈: tokio + axum + SQLite
// 环境变量:
// - PACKING_DISPATCH_DB_PATH: 数据库路径
// - PACKING_DISPATCH_BIND: 监听地址（默认 127.0.0.1:8080）
// - PACKING_DISPATCH_LOG_JSON: JSON 日志
// ==========================================

use anyhow::Context;
use packing_dispatch::app::{get_default_db_path, router, AppState};
use packing_dispatch::logging;
use std::sync::Arc;

const BIND_ENV: &str = "PACKING_DISPATCH_BIND";
const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", packing_dispatch::APP_NAME);
    tracing::info!("系统版本: {}", packing_dispatch::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let bind = std::env::var(BIND_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("无法监听 {}", bind))?;
    tracing::info!(addr = %bind, "HTTP 服务已启动");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "无法监听退出信号");
    }
}
