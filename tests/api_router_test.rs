// ==========================================
// HTTP 路由测试
// ==========================================
// 通过 tower::ServiceExt::oneshot 直接驱动 Router，不监听端口
// ==========================================


use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use packing_dispatch::app::{router, SESSION_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use test_helpers::{
    build_state, create_test_db, order_row, orders_xlsx, RecordingSupplyService, ScriptedCarrier,
};
use tower::ServiceExt;

const BOUNDARY: &str = "----packing-dispatch-boundary";

async fn test_router(supply: Arc<RecordingSupplyService>) -> (NamedTempFile, Router) {
    let (tmp, db_path) = create_test_db().unwrap();
    let state = build_state(&db_path, ScriptedCarrier::new(), supply).await;
    (tmp, router(Arc::new(state)))
}

/// 组装单字段 multipart 请求体
fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn import_request(session: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/shipments/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    builder.body(Body::from(body)).unwrap()
}

fn session_request(method: &str, uri: &str, session: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(SESSION_HEADER, session)
        .body(Body::empty())
        .unwrap()
}

fn json_request(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn supply_payload(products: Value) -> Value {
    json!({
        "order": {
            "order_no": 5501,
            "ue_no": "UE-77",
            "store": 123,
            "picker_id": 42,
            "picker_name": "Ana Torres"
        },
        "lines": [
            {
                "order_no": 5501,
                "sku": 1001,
                "ean": "7500000001001",
                "descripcion": "Cafe molido 500g",
                "precio": 89.5,
                "unidad_medida": "PZA"
            }
        ],
        "products": products
    })
}

#[tokio::test]
async fn test_health() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_import_without_file_field() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;

    let response = app
        .oneshot(import_request(None, multipart_body("otherField", "x.xlsx", b"abc")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // 未带会话头时服务端生成
    assert!(response.headers().get(SESSION_HEADER).is_some());
    let body = read_json(response).await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["message"], "No File Selected");
}

#[tokio::test]
async fn test_import_then_list_and_dispatch() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;
    let xlsx = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-A", "UCC-002", "64000")),
    ]);

    let response = app
        .clone()
        .oneshot(import_request(Some("web-1"), multipart_body("importFile", "ordenes.xlsx", &xlsx)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(SESSION_HEADER).unwrap(), "web-1");
    let body = read_json(response).await;
    assert_eq!(body["status"], 1);
    assert_eq!(body["message"], "File Imported Successfully");
    assert_eq!(body["list"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(session_request("GET", "/api/shipments/staged", "web-1"))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][1]["pk"], "UCC-002");

    let response = app
        .clone()
        .oneshot(session_request("POST", "/api/shipments/dispatch", "web-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], 1);
    assert_eq!(body["report"]["succeeded"], 1);
    assert_eq!(body["report"]["outcomes"][0]["status"], "SUCCEEDED");
}

#[tokio::test]
async fn test_import_unreadable_file_reports_failure() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;

    let response = app
        .oneshot(import_request(
            Some("web-1"),
            multipart_body("importFile", "ordenes.pdf", b"%PDF-1.4"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], 0);
    assert!(body["message"].as_str().unwrap().starts_with("Import failed"));
}

#[tokio::test]
async fn test_import_upload_without_file_name_is_detected_by_content() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;
    let bytes = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);

    let response = app
        .oneshot(import_request(Some("web-1"), multipart_body("importFile", "", &bytes)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], 1);
    assert_eq!(body["list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_staged_requires_session_header() {
    let (_tmp, app) = test_router(RecordingSupplyService::accepting()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/shipments/staged")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains(SESSION_HEADER));
}

#[tokio::test]
async fn test_supply_complete_success() {
    let supply = RecordingSupplyService::accepting();
    let (_tmp, app) = test_router(supply.clone()).await;

    let response = app
        .oneshot(json_request(
            "/api/supply/complete",
            &supply_payload(json!([{ "product_id": 1001, "new_quantity": 3.0 }])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Alta exitosa");

    let requests = supply.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "http://localhost:8089/api/FinalizarSurtido");
    assert_eq!(requests[0].1.orden.numero_unidad_ejecucion, "UE-77");
    assert_eq!(requests[0].1.productos_suministrados[0].cantidad, 3.0);
}

#[tokio::test]
async fn test_supply_complete_missing_product_is_bad_request() {
    let supply = RecordingSupplyService::accepting();
    let (_tmp, app) = test_router(supply.clone()).await;

    let response = app
        .oneshot(json_request(
            "/api/supply/complete",
            &supply_payload(json!([{ "product_id": 42, "new_quantity": 1.0 }])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("missing product 42"));
    assert!(supply.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_supply_complete_remote_rejection_is_bad_gateway() {
    let (_tmp, app) = test_router(RecordingSupplyService::with_code("05", "Orden ya cerrada")).await;

    let response = app
        .oneshot(json_request(
            "/api/supply/complete",
            &supply_payload(json!([{ "product_id": 1001, "new_quantity": 2.0 }])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Orden ya cerrada");
}
