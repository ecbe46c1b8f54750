#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use safety_board::api::transport::HttpTransport;
use safety_board::error::TransportError;
use safety_board::models::clock::ManualClock;
use safety_board::services::aggregator::StatusPrecedence;
use safety_board::{AppConfig, BoardService};
use serde_json::{json, Value};

pub const START_MILLIS: u64 = 1_700_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Token,
    Fields,
    Records,
}

impl Endpoint {
    fn from_url(url: &str) -> Self {
        if url.contains("tenant_access_token") {
            Endpoint::Token
        } else if url.contains("/fields") {
            Endpoint::Fields
        } else {
            Endpoint::Records
        }
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: Endpoint,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Scripted upstream. Each endpoint answers with its configured reply until
/// changed.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<Endpoint, Result<Value, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn healthy(records: Value) -> Arc<Self> {
        let fake = Arc::new(Self::default());
        fake.reply(Endpoint::Token, token_body("t-1"));
        fake.reply(Endpoint::Fields, fields_body());
        fake.reply(Endpoint::Records, records_body(records));
        fake
    }

    pub fn reply(&self, endpoint: Endpoint, body: Value) {
        self.replies.lock().unwrap().insert(endpoint, Ok(body));
    }

    pub fn fail(&self, endpoint: Endpoint, reason: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint, Err(reason.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    fn respond(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let endpoint = Endpoint::from_url(url);
        self.calls.lock().unwrap().push(Call {
            endpoint,
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            body: body.cloned(),
        });
        match self.replies.lock().unwrap().get(&endpoint) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(reason)) => Err(TransportError::Network(reason.clone())),
            None => Err(TransportError::Network("no scripted reply".to_string())),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<Value, TransportError> {
        self.respond(url, bearer, None)
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.respond(url, bearer, Some(body))
    }
}

pub fn test_config(precedence: StatusPrecedence) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        app_id: "cli_test".to_string(),
        app_secret: "secret".to_string(),
        app_token: "bascnApp".to_string(),
        table_id: "tblTable".to_string(),
        view_id: "vewView".to_string(),
        submit_url: "https://example.com/form".to_string(),
        api_base_url: "http://upstream.test/open-apis".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        status_precedence: precedence,
    })
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub clock: Arc<ManualClock>,
    pub board: Arc<BoardService>,
}

pub fn harness(records: Value) -> Harness {
    harness_with(records, StatusPrecedence::Legacy)
}

pub fn harness_with(records: Value, precedence: StatusPrecedence) -> Harness {
    let transport = FakeTransport::healthy(records);
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let board = Arc::new(BoardService::new(
        test_config(precedence),
        transport.clone(),
        clock.clone(),
    ));
    Harness {
        transport,
        clock,
        board,
    }
}

pub fn token_body(token: &str) -> Value {
    json!({"code": 0, "msg": "ok", "tenant_access_token": token, "expire": 7200})
}

pub fn fields_body() -> Value {
    json!({
        "code": 0,
        "msg": "success",
        "data": {
            "has_more": false,
            "items": [
                {"field_id": "fld1", "field_name": "楼栋号", "is_hidden": false, "is_primary": true,
                 "property": null, "type": 1, "ui_type": "Text"},
                {"field_id": "fld2", "field_name": "安全状态", "is_hidden": false, "is_primary": false,
                 "property": {"options": [{"color": 0, "id": "opt1", "name": "安全"}]},
                 "type": 3, "ui_type": "SingleSelect"}
            ]
        }
    })
}

pub fn records_body(items: Value) -> Value {
    let total = items.as_array().map(|a| a.len()).unwrap_or(0);
    json!({
        "code": 0,
        "msg": "success",
        "data": {"has_more": false, "total": total, "items": items}
    })
}

pub fn record(id: &str, building: &str, floor: &str, room: &str, at: i64, status: &str) -> Value {
    json!({
        "record_id": id,
        "fields": {
            "提交人": [{"id": "ou_1", "name": "李四", "en_name": "Li Si"}],
            "提交时间": at,
            "楼栋号": building,
            "楼层": floor,
            "房号": room,
            "安全状态": status
        }
    })
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
