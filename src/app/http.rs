// ==========================================
// 待打包订单发运系统 - HTTP 路由
// ==========================================
// POST /api/shipments/import    multipart: importFile
// GET  /api/shipments/staged
// POST /api/shipments/dispatch
// POST /api/supply/complete
// GET  /api/health
// 会话: X-Session-Id 请求头（导入时缺省则生成并在响应中返回）
// ==========================================

use crate::api::{
    ApiError, DispatchResponse, ImportResponse, StagedResponse, SupplyCompletionRequest,
    SupplyCompletionResponse,
};
use crate::app::state::AppState;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-id";
pub const IMPORT_FIELD: &str = "importFile";

/// 上传大小上限（20 MiB）
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/shipments/import", post(import_shipments))
        .route("/api/shipments/staged", get(list_staged))
        .route("/api/shipments/dispatch", post(dispatch_shipments))
        .route("/api/supply/complete", post(complete_supply))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ==========================================
// 错误响应: { success: false, message }
// ==========================================
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::SupplyCompletion(_) | ApiError::CarrierSetup(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        }
        (status, Json(json!({ "success": false, "message": self.to_string() }))).into_response()
    }
}

fn session_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require_session(headers: &HeaderMap) -> Result<String, ApiError> {
    session_from(headers)
        .ok_or_else(|| ApiError::InvalidInput(format!("missing {} header", SESSION_HEADER)))
}

// ==========================================
// Handlers
// ==========================================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

async fn import_shipments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let session_id = session_from(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("multipart: {}", e)))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("multipart: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let response = match upload {
        Some((file_name, bytes)) if !(file_name.is_empty() && bytes.is_empty()) => {
            state
                .shipment_api
                .import_file(&session_id, &file_name, &bytes)
                .await?
        }
        _ => ImportResponse::failed(&session_id, crate::api::shipment_api::MSG_NO_FILE),
    };

    Ok(with_session(Json(response).into_response(), &session_id))
}

async fn list_staged(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StagedResponse>, ApiError> {
    let session_id = require_session(&headers)?;
    Ok(Json(state.shipment_api.list_staged(&session_id)?))
}

async fn dispatch_shipments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DispatchResponse>, ApiError> {
    let session_id = require_session(&headers)?;
    Ok(Json(state.shipment_api.dispatch(&session_id).await?))
}

async fn complete_supply(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SupplyCompletionRequest>,
) -> Result<Json<SupplyCompletionResponse>, ApiError> {
    Ok(Json(state.supply_api.complete(&request).await?))
}

fn with_session(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
