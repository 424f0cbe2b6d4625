//! Scripted platform stand-in shared by this crate's tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use botvs_client::{BotvsAuth, HttpResponse, RpcClient, Transport};
use common::Error;
use serde_json::Value;

/// One recorded RPC: method name and parsed args.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

/// Answers POSTs by method name and GETs with a fixed catalog body.
#[derive(Default)]
pub struct StubPlatform {
    replies: Mutex<HashMap<String, Value>>,
    catalog: Mutex<Option<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    gets: Mutex<usize>,
}

impl StubPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(method.to_string(), body);
    }

    pub fn serve_catalog(&self, body: &str) {
        *self.catalog.lock().unwrap() = Some(body.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn gets(&self) -> usize {
        *self.gets.lock().unwrap()
    }

    pub fn client(self: &Arc<Self>) -> RpcClient {
        let auth = BotvsAuth::new("xxxxx", "yyyyy").unwrap();
        RpcClient::new(auth, self.clone(), "https://stub.invalid/api/v1")
    }
}

#[async_trait]
impl Transport for StubPlatform {
    async fn post_form(
        &self,
        _url: &str,
        form: &[(&'static str, String)],
    ) -> Result<HttpResponse, Error> {
        let get = |name: &str| {
            form.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let method = get("method");
        let args: Vec<Value> = serde_json::from_str(&get("args")).unwrap();
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            args,
        });

        let reply = self.replies.lock().unwrap().get(&method).cloned();
        Ok(match reply {
            Some(body) => HttpResponse {
                status: 200,
                body: body.to_string(),
            },
            None => HttpResponse {
                status: 404,
                body: String::new(),
            },
        })
    }

    async fn get(&self, _url: &str) -> Result<HttpResponse, Error> {
        *self.gets.lock().unwrap() += 1;
        Ok(match self.catalog.lock().unwrap().clone() {
            Some(body) => HttpResponse { status: 200, body },
            None => HttpResponse {
                status: 500,
                body: String::new(),
            },
        })
    }
}

pub const CATALOG: &str = r#"[
    {"eid":"Huobi","name":"Huobi","stocks":"BTC_CNY,LTC_CNY","symbols":["BTC_CNY","LTC_CNY"]},
    {"eid":"OKCoin_EN","name":"OKCoin","stocks":"BTC_USD,LTC_USD","symbols":["BTC_USD"]}
]"#;
