#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chatsync_client::{ChatClient, ClientConfig, MemoryTokenStore, TokenStore};
use httpmock::prelude::*;
use serde_json::json;

pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "pw";
pub const ACCESS: &str = "access-1";
pub const REFRESH: &str = "refresh-1";
pub const BEARER: &str = "Bearer access-1";

pub fn config(server: &MockServer, poll_interval: Duration) -> ClientConfig {
    ClientConfig {
        base_url: server.base_url(),
        poll_interval,
        request_timeout: Duration::from_secs(2),
        token_path: None,
    }
}

pub fn client(server: &MockServer) -> (ChatClient, Arc<MemoryTokenStore>) {
    client_with_interval(server, Duration::from_secs(5))
}

pub fn client_with_interval(
    server: &MockServer,
    poll_interval: Duration,
) -> (ChatClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let shared: Arc<dyn TokenStore> = store.clone();
    let client = ChatClient::with_store(&config(server, poll_interval), shared)
        .expect("client should build");
    (client, store)
}

pub async fn mock_login(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/login/")
                .json_body(json!({ "email": EMAIL, "password": PASSWORD }));
            then.status(200).json_body(json!({
                "data": {
                    "id": 1,
                    "email": EMAIL,
                    "first_name": "Ann",
                    "last_name": "Lee",
                    "access_token": ACCESS,
                    "refresh_token": REFRESH
                }
            }));
        })
        .await
}

/// Log `client` in against a freshly mocked login endpoint
pub async fn logged_in(server: &MockServer, poll_interval: Duration) -> (ChatClient, Arc<MemoryTokenStore>) {
    let mut login = mock_login(server).await;
    let (client, store) = client_with_interval(server, poll_interval);
    client.login(EMAIL, PASSWORD).await.expect("login should succeed");
    login.delete_async().await;
    (client, store)
}

pub fn expired_token_body() -> serde_json::Value {
    json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid",
        "messages": []
    })
}

pub fn messages_body(entries: &[(&str, &str)]) -> serde_json::Value {
    serde_json::Value::Array(
        entries
            .iter()
            .map(|(name, content)| json!({ "sender": { "first_name": name }, "content": content }))
            .collect(),
    )
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
