mod common;

use common::{harness, record, records_body, token_body, Endpoint};
use safety_board::api::feishu::{TABLE_FIELDS_KEY, TABLE_RECORDS_KEY};
use safety_board::BoardError;
use serde_json::json;

#[tokio::test]
async fn token_is_reused_within_fresh_window_and_refetched_after() {
    let h = harness(json!([]));
    let api = h.board.api();

    assert_eq!(api.get_tenant_access_token().await.unwrap(), "t-1");
    h.clock.advance_secs(29);
    assert_eq!(api.get_tenant_access_token().await.unwrap(), "t-1");
    assert_eq!(h.transport.count(Endpoint::Token), 1);

    h.transport.reply(Endpoint::Token, token_body("t-2"));
    h.clock.advance_secs(2);
    assert_eq!(api.get_tenant_access_token().await.unwrap(), "t-2");
    assert_eq!(h.transport.count(Endpoint::Token), 2);
}

#[tokio::test]
async fn token_exchange_sends_app_credentials() {
    let h = harness(json!([]));
    h.board.api().get_tenant_access_token().await.unwrap();

    let call = &h.transport.calls()[0];
    assert_eq!(
        call.url,
        "http://upstream.test/open-apis/auth/v3/tenant_access_token/internal"
    );
    assert_eq!(call.bearer, None);
    assert_eq!(
        call.body,
        Some(json!({"app_id": "cli_test", "app_secret": "secret"}))
    );
}

#[tokio::test]
async fn token_nested_under_data_is_accepted() {
    let h = harness(json!([]));
    h.transport.reply(
        Endpoint::Token,
        json!({"code": 0, "msg": "ok", "data": {"tenant_access_token": "nested", "expire": 7200}}),
    );
    assert_eq!(h.board.api().get_tenant_access_token().await.unwrap(), "nested");
}

#[tokio::test]
async fn token_failures_are_auth_errors() {
    let h = harness(json!([]));
    let api = h.board.api();

    h.transport.reply(
        Endpoint::Token,
        json!({"code": 10003, "msg": "invalid param"}),
    );
    let err = api.get_tenant_access_token().await.unwrap_err();
    assert!(matches!(&err, BoardError::Auth(msg) if msg.contains("invalid param") && msg.contains("10003")));

    h.transport.reply(Endpoint::Token, json!({"code": 0, "msg": "ok"}));
    let err = api.get_tenant_access_token().await.unwrap_err();
    assert!(matches!(err, BoardError::Auth(_)));

    h.transport.fail(Endpoint::Token, "connection refused");
    let err = api.get_tenant_access_token().await.unwrap_err();
    assert!(matches!(&err, BoardError::Auth(msg) if msg.contains("connection refused")));

    h.transport.reply(Endpoint::Token, json!({"msg": "no code"}));
    let err = api.get_tenant_access_token().await.unwrap_err();
    assert!(matches!(err, BoardError::MalformedResponse(_)));

    assert!(api.cache().is_empty());
}

#[tokio::test]
async fn records_request_is_authenticated_and_paged() {
    let h = harness(json!([record("rec1", "1栋", "1楼", "1号", 10, "安全")]));
    let page = h.board.api().get_table_records().await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 1);
    assert!(!page.has_more);

    let calls = h.transport.calls();
    let call = calls
        .iter()
        .find(|c| c.endpoint == Endpoint::Records)
        .unwrap();
    assert_eq!(
        call.url,
        "http://upstream.test/open-apis/bitable/v1/apps/bascnApp/tables/tblTable/records/search?page_size=500"
    );
    assert_eq!(call.bearer.as_deref(), Some("t-1"));
    assert_eq!(call.body, Some(json!({"view_id": "vewView"})));
}

#[tokio::test]
async fn fields_request_targets_the_configured_view() {
    let h = harness(json!([]));
    let fields = h.board.api().get_table_fields().await.unwrap();
    assert_eq!(fields.items.len(), 2);
    assert_eq!(fields.items[1].field_name, "安全状态");

    let calls = h.transport.calls();
    let call = calls
        .iter()
        .find(|c| c.endpoint == Endpoint::Fields)
        .unwrap();
    assert_eq!(
        call.url,
        "http://upstream.test/open-apis/bitable/v1/apps/bascnApp/tables/tblTable/fields?view_id=vewView"
    );
    assert_eq!(call.bearer.as_deref(), Some("t-1"));
}

#[tokio::test]
async fn records_are_cached_until_the_entry_expires() {
    let h = harness(json!([record("rec1", "A", "1", "1", 10, "安全")]));
    let api = h.board.api();

    api.get_table_records().await.unwrap();
    h.clock.advance_secs(20);
    api.get_table_records().await.unwrap();
    assert_eq!(h.transport.count(Endpoint::Records), 1);

    h.clock.advance_secs(11);
    api.get_table_records().await.unwrap();
    assert_eq!(h.transport.count(Endpoint::Records), 2);
}

#[tokio::test]
async fn upstream_errors_are_not_cached() {
    let h = harness(json!([]));
    let api = h.board.api();

    h.transport
        .reply(Endpoint::Records, json!({"code": 1254040, "msg": "TableIdNotFound"}));
    let err = api.get_table_records().await.unwrap_err();
    assert!(matches!(&err, BoardError::Upstream(msg) if msg.contains("TableIdNotFound")));

    h.transport.reply(Endpoint::Records, json!({"code": 0, "msg": "ok"}));
    let err = api.get_table_records().await.unwrap_err();
    assert!(matches!(err, BoardError::Upstream(_)));

    h.transport.fail(Endpoint::Fields, "timed out");
    let err = api.get_table_fields().await.unwrap_err();
    assert!(matches!(err, BoardError::Upstream(_)));

    h.transport.reply(
        Endpoint::Records,
        records_body(json!([record("rec1", "A", "1", "1", 10, "安全")])),
    );
    assert_eq!(api.get_table_records().await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn refresh_evicts_and_repopulates() {
    let h = harness(json!([record("rec1", "A", "1", "1", 10, "安全")]));
    let api = h.board.api();
    api.get_table_fields().await.unwrap();
    api.get_table_records().await.unwrap();

    h.transport.reply(
        Endpoint::Records,
        records_body(json!([
            record("rec1", "A", "1", "1", 10, "安全"),
            record("rec2", "A", "1", "2", 20, "危险"),
        ])),
    );

    let first = api.refresh_cache();
    let second = api.refresh_cache();
    first.finished().await;
    second.finished().await;

    assert!(api.cache().get(TABLE_FIELDS_KEY, false).is_some());
    assert!(api.cache().get(TABLE_RECORDS_KEY, false).is_some());
    assert_eq!(api.get_table_records().await.unwrap().items.len(), 2);
    assert!(h.transport.count(Endpoint::Records) >= 2);
}

#[tokio::test]
async fn refresh_failures_are_swallowed() {
    let h = harness(json!([]));
    h.transport.fail(Endpoint::Token, "down");

    h.board.refresh().finished().await;

    assert!(h.board.api().cache().is_empty());
}
