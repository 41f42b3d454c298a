// ==========================================
// 导入 → 暂存 → 发运 端到端测试
// ==========================================
// 承运商使用 ScriptedCarrier 替身，台账/配置使用临时 SQLite
// ==========================================


use packing_dispatch::config::config_keys;
use packing_dispatch::dispatch::CarrierError;
use packing_dispatch::domain::DispatchStatus;
use packing_dispatch::logging;
use test_helpers::{
    build_state, create_test_db, order_row, orders_xlsx, RecordingSupplyService, ScriptedCarrier,
};

const SESSION: &str = "session-1";

#[tokio::test]
async fn test_rows_sharing_reference_become_one_shipment() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-B", "UCC-002", "64000")),
        Some(order_row("REF-A", "UCC-003", "64000")),
    ]);
    let imported = state
        .shipment_api
        .import_file(SESSION, "ordenes.xlsx", &bytes)
        .await
        .unwrap();
    assert_eq!(imported.status, 1);
    assert_eq!(imported.message, "File Imported Successfully");
    assert_eq!(imported.list.len(), 3);

    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    assert_eq!(response.status, 1);
    assert_eq!(response.report.total_groups, 2);
    assert_eq!(response.report.succeeded, 2);
    assert_eq!(response.message, "2 shipment(s) dispatched");

    let calls = carrier.calls();
    assert_eq!(calls.len(), 2);
    let embarque_a = &calls[0].embarques.embarque;
    assert_eq!(calls[0].siglas_cliente, "SOR");
    assert_eq!(embarque_a.referencia2, "REF-A");
    assert_eq!(embarque_a.ucc_list, vec!["UCC-001", "UCC-003"]);
    assert_eq!(embarque_a.codigo_postal, 64000);
    assert_eq!(embarque_a.telefono, "8112345678");
    assert_eq!(embarque_a.referencia7, response.report.outcomes[0].idempotency_key.clone().unwrap());

    // 全部完成后暂存清空
    let staged = state.shipment_api.list_staged(SESSION).unwrap();
    assert!(staged.success);
    assert!(staged.data.is_empty());
}

#[tokio::test]
async fn test_invalid_group_is_rejected_and_stays_staged() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-B", "UCC-002", "64O00")),
    ]);
    state
        .shipment_api
        .import_file(SESSION, "ordenes.xlsx", &bytes)
        .await
        .unwrap();

    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    assert_eq!(response.status, 0);
    assert_eq!(response.report.succeeded, 1);
    assert_eq!(response.report.failed, 1);
    assert!(response.message.contains("1 of 2"));

    let rejected = &response.report.outcomes[1];
    assert_eq!(rejected.referencia, "REF-B");
    assert_eq!(rejected.status, DispatchStatus::Rejected);
    assert!(rejected.message.contains("invalid postal code"));
    assert_eq!(rejected.attempts, 0);

    // 拒绝的分组不调用承运商
    assert_eq!(carrier.call_count("REF-B"), 0);

    let staged = state.shipment_api.list_staged(SESSION).unwrap();
    assert_eq!(staged.data.len(), 1);
    assert_eq!(staged.data[0].referencia, "REF-B");
    assert_eq!(staged.data[0].row_number, 3);

    let ledger = state.ledger.list_by_referencia("REF-B").unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, DispatchStatus::Rejected);
}

#[tokio::test]
async fn test_redispatch_of_same_data_is_skipped() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-B", "UCC-002", "64000")),
    ]);

    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let first = state.shipment_api.dispatch(SESSION).await.unwrap();
    assert_eq!(first.report.succeeded, 2);

    // 同一文件重新导入后再次发运
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let second = state.shipment_api.dispatch(SESSION).await.unwrap();

    assert_eq!(second.status, 1);
    assert_eq!(second.report.skipped, 2);
    assert_eq!(second.report.succeeded, 0);
    assert!(second
        .report
        .outcomes
        .iter()
        .all(|o| o.status == DispatchStatus::Skipped && o.message == "already dispatched"));
    assert_eq!(carrier.calls().len(), 2);
}

#[tokio::test]
async fn test_changed_pallets_are_a_new_shipment() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let first = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &first).await.unwrap();
    state.shipment_api.dispatch(SESSION).await.unwrap();

    let second = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-A", "UCC-009", "64000")),
    ]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &second).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    assert_eq!(response.report.succeeded, 1);
    assert_eq!(carrier.call_count("REF-A"), 2);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    carrier.fail_next(
        "REF-A",
        vec![
            CarrierError::Timeout(30_000),
            CarrierError::HttpStatus {
                status: 503,
                body: "Service Unavailable".to_string(),
            },
        ],
    );
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    let outcome = &response.report.outcomes[0];
    assert_eq!(outcome.status, DispatchStatus::Succeeded);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(carrier.call_count("REF-A"), 3);

    let ledger = state.ledger.list_by_referencia("REF-A").unwrap();
    assert_eq!(ledger[0].status, DispatchStatus::Succeeded);
    assert_eq!(ledger[0].attempts, 3);
}

#[tokio::test]
async fn test_retries_exhausted_marks_failed_and_keeps_rows() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    carrier.fail_next(
        "REF-A",
        vec![
            CarrierError::Transport("connection refused".to_string()),
            CarrierError::Transport("connection refused".to_string()),
            CarrierError::Transport("connection refused".to_string()),
        ],
    );
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-B", "UCC-002", "64000")),
    ]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    let failed = &response.report.outcomes[0];
    assert_eq!(failed.status, DispatchStatus::Failed);
    assert_eq!(failed.attempts, 3);
    assert!(failed.message.contains("connection refused"));
    // 单组失败不影响后续分组
    assert_eq!(response.report.outcomes[1].status, DispatchStatus::Succeeded);

    let staged = state.shipment_api.list_staged(SESSION).unwrap();
    assert_eq!(staged.data.len(), 1);
    assert_eq!(staged.data[0].referencia, "REF-A");

    // 再次发运只处理剩余分组，且能成功
    let retry = state.shipment_api.dispatch(SESSION).await.unwrap();
    assert_eq!(retry.status, 1);
    assert_eq!(retry.report.total_groups, 1);
    assert_eq!(retry.report.succeeded, 1);
    assert_eq!(carrier.call_count("REF-B"), 1);
}

#[tokio::test]
async fn test_fault_is_not_retried() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    carrier.fail_next(
        "REF-A",
        vec![CarrierError::Fault {
            code: "s:Client".to_string(),
            message: "Cliente no valido".to_string(),
        }],
    );
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    let outcome = &response.report.outcomes[0];
    assert_eq!(outcome.status, DispatchStatus::Failed);
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.message.contains("Cliente no valido"));
    assert_eq!(carrier.call_count("REF-A"), 1);
}

#[tokio::test]
async fn test_dispatch_without_staged_batch() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let response = state.shipment_api.dispatch("nobody").await.unwrap();

    assert_eq!(response.status, 1);
    assert_eq!(response.report.total_groups, 0);
    assert!(response.report.batch_id.is_none());
    assert!(carrier.calls().is_empty());
}

#[tokio::test]
async fn test_capacity_overflow_rejects_group() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;
    state
        .config
        .set_config_value(config_keys::MAX_ITEMS_PER_SHIPMENT, "1")
        .unwrap();

    let bytes = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-A", "UCC-002", "64000")),
        Some(order_row("REF-B", "UCC-003", "64000")),
    ]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &bytes).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();

    let overflow = &response.report.outcomes[0];
    assert_eq!(overflow.status, DispatchStatus::Rejected);
    assert_eq!(overflow.message, "too many items: 2 > 1");
    assert_eq!(response.report.outcomes[1].status, DispatchStatus::Succeeded);
    assert_eq!(carrier.call_count("REF-A"), 0);
}

#[tokio::test]
async fn test_failed_import_keeps_previous_staging() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let good = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    let imported = state
        .shipment_api
        .import_file(SESSION, "ordenes.xlsx", &good)
        .await
        .unwrap();

    let mut bad_row = order_row("REF-B", "UCC-002", "64000");
    bad_row[2] = String::new();
    let bad = orders_xlsx(&[Some(bad_row)]);
    let failed = state
        .shipment_api
        .import_file(SESSION, "ordenes.xlsx", &bad)
        .await
        .unwrap();

    assert_eq!(failed.status, 0);
    assert!(failed.message.starts_with("Import failed"));
    assert!(failed.list.is_empty());

    let first = state.shipment_api.list_staged(SESSION).unwrap();
    let second = state.shipment_api.list_staged(SESSION).unwrap();
    assert_eq!(first.batch_id, imported.batch_id);
    assert_eq!(first.data, second.data);
    assert_eq!(first.data[0].referencia, "REF-A");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file("alpha", "ordenes.xlsx", &bytes).await.unwrap();

    assert!(state.shipment_api.list_staged("beta").unwrap().data.is_empty());
    let response = state.shipment_api.dispatch("beta").await.unwrap();
    assert_eq!(response.report.total_groups, 0);
    assert_eq!(state.shipment_api.list_staged("alpha").unwrap().data.len(), 1);
}

#[tokio::test]
async fn test_carrier_settings_are_reread_for_each_dispatch() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let first = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &first).await.unwrap();
    state.shipment_api.dispatch(SESSION).await.unwrap();

    state
        .config
        .set_config_value(config_keys::CARRIER_ENDPOINT_URL, "http://carrier-b.local/Embarques.svc")
        .unwrap();
    state
        .config
        .set_config_value(config_keys::CARRIER_CLIENT_CODE, "CDS")
        .unwrap();

    let second = orders_xlsx(&[Some(order_row("REF-B", "UCC-002", "64000"))]);
    state.shipment_api.import_file(SESSION, "ordenes.xlsx", &second).await.unwrap();
    let response = state.shipment_api.dispatch(SESSION).await.unwrap();
    assert_eq!(response.status, 1);

    let endpoints = carrier.endpoints();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0], "http://localhost:8089/EmbarquesService.svc");
    assert_eq!(endpoints[1], "http://carrier-b.local/Embarques.svc");
    assert_eq!(carrier.calls()[1].siglas_cliente, "CDS");
}
