// ==========================================
// 并发导入测试
// ==========================================
// 测试目标: 多个会话同时导入/发运时暂存互不干扰
// ==========================================


use packing_dispatch::api::shipment_api::MSG_DISPATCH_IN_PROGRESS;
use packing_dispatch::domain::DispatchStatus;
use packing_dispatch::logging;
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::{
    build_state, create_test_db, order_row, orders_xlsx, RecordingSupplyService, ScriptedCarrier,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_import_and_dispatch() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let carrier = ScriptedCarrier::new();
    let state = Arc::new(
        build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await,
    );

    let start = Instant::now();
    let mut handles = Vec::new();
    for i in 0..8 {
        let state = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            let session = format!("session-{}", i);
            let referencia = format!("REF-{}", i);
            let bytes = orders_xlsx(&[
                Some(order_row(&referencia, &format!("UCC-{}-1", i), "64000")),
                Some(order_row(&referencia, &format!("UCC-{}-2", i), "64000")),
            ]);

            let imported = state
                .shipment_api
                .import_file(&session, "ordenes.xlsx", &bytes)
                .await
                .unwrap();
            assert_eq!(imported.status, 1);

            let staged = state.shipment_api.list_staged(&session).unwrap();
            assert!(staged.data.iter().all(|row| row.referencia == referencia));

            state.shipment_api.dispatch(&session).await.unwrap()
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status, 1);
        assert_eq!(response.report.total_groups, 1);
        assert_eq!(response.report.outcomes[0].status, DispatchStatus::Succeeded);
    }

    println!("8 个会话并发导入+发运耗时: {:?}", start.elapsed());

    assert_eq!(carrier.calls().len(), 8);
    assert!(state.staging.is_empty().unwrap());
}

#[tokio::test]
async fn test_reimport_replaces_previous_batch() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = build_state(
        &db_path,
        ScriptedCarrier::new(),
        RecordingSupplyService::accepting(),
    )
    .await;

    let first = orders_xlsx(&[
        Some(order_row("REF-A", "UCC-001", "64000")),
        Some(order_row("REF-B", "UCC-002", "64000")),
    ]);
    let second = orders_xlsx(&[Some(order_row("REF-C", "UCC-003", "64000"))]);

    let a = state
        .shipment_api
        .import_file("s1", "ordenes.xlsx", &first)
        .await
        .unwrap();
    let b = state
        .shipment_api
        .import_file("s1", "ordenes.xlsx", &second)
        .await
        .unwrap();
    assert_ne!(a.batch_id, b.batch_id);

    let staged = state.shipment_api.list_staged("s1").unwrap();
    assert_eq!(staged.batch_id, b.batch_id);
    assert_eq!(staged.data.len(), 1);
    assert_eq!(staged.data[0].referencia, "REF-C");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_dispatch_of_one_session_calls_carrier_once() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let carrier = ScriptedCarrier::new();
    carrier.set_delay(Duration::from_millis(100));
    let state = build_state(&db_path, carrier.clone(), RecordingSupplyService::accepting()).await;

    let bytes = orders_xlsx(&[Some(order_row("REF-A", "UCC-001", "64000"))]);
    state.shipment_api.import_file("s", "ordenes.xlsx", &bytes).await.unwrap();

    let (first, second) = tokio::join!(
        state.shipment_api.dispatch("s"),
        state.shipment_api.dispatch("s")
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(carrier.call_count("REF-A"), 1);

    let (done, refused) = if first.report.total_groups == 1 {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(done.status, 1);
    assert_eq!(done.report.succeeded, 1);
    assert_eq!(refused.status, 0);
    assert_eq!(refused.message, MSG_DISPATCH_IN_PROGRESS);
    assert_eq!(refused.report.total_groups, 0);

    // 发运结束后释放，会话可再次发运
    let after = state.shipment_api.dispatch("s").await.unwrap();
    assert_eq!(after.status, 1);
    assert_eq!(after.message, "Nothing to dispatch");
    assert_eq!(carrier.call_count("REF-A"), 1);
}
