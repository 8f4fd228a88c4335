// till-client/src/rest.rs
// REST 存储客户端 - PostgREST 风格的 HTTP 通信

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::{Collection, Query, RemoteStore, StoreError, StoreResult};

/// Obtains a fresh bearer token once the current one is rejected
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(&self) -> StoreResult<String>;
}

/// REST store configuration
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Base URL, e.g. `http://localhost:54321/rest/v1`
    pub base_url: String,
    /// Sent as `apikey` and, until a session token exists, as bearer token
    pub api_key: String,
    pub timeout: Duration,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 网络存储客户端
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    token: RwLock<Option<String>>,
    refresher: Option<Arc<dyn SessionRefresher>>,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("has_refresher", &self.refresher.is_some())
            .finish()
    }
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            token: RwLock::new(None),
            refresher: None,
        })
    }

    pub fn with_session_refresher(mut self, refresher: Arc<dyn SessionRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// 设置会话令牌
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.as_str())
    }

    fn headers(&self) -> StoreResult<HeaderMap> {
        let bearer = self
            .token
            .read()
            .clone()
            .unwrap_or_else(|| self.api_key.clone());
        let mut headers = HeaderMap::new();
        if !self.api_key.is_empty() {
            headers.insert("apikey", header_value(&self.api_key)?);
        }
        if !bearer.is_empty() {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
        }
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        Ok(headers)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<Value>> {
        let response = request.headers(self.headers()?).send().await?;
        handle_response(response).await
    }
}

fn header_value(value: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| StoreError::Validation(format!("invalid header value: {}", e)))
}

async fn handle_response(response: Response) -> StoreResult<Vec<Value>> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %text, "store request failed");
        return Err(StoreError::from_status(status, text));
    }
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&text)? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Value>> {
        let request = self.client.get(self.url(collection)).query(&query.to_params());
        self.send(request).await
    }

    async fn insert(&self, collection: Collection, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let request = self.client.post(self.url(collection)).json(&rows);
        self.send(request).await
    }

    async fn update(
        &self,
        collection: Collection,
        query: &Query,
        patch: Value,
    ) -> StoreResult<Vec<Value>> {
        let request = self
            .client
            .patch(self.url(collection))
            .query(&query.to_params())
            .json(&patch);
        self.send(request).await
    }

    async fn delete(&self, collection: Collection, query: &Query) -> StoreResult<usize> {
        let request = self.client.delete(self.url(collection)).query(&query.to_params());
        Ok(self.send(request).await?.len())
    }

    async fn refresh_session(&self) -> StoreResult<()> {
        let refresher = self
            .refresher
            .as_ref()
            .ok_or_else(|| StoreError::Unauthorized("no session refresher configured".into()))?;
        let token = refresher.refresh().await?;
        self.set_token(token);
        tracing::info!("store session refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedToken;

    #[async_trait]
    impl SessionRefresher for FixedToken {
        async fn refresh(&self) -> StoreResult<String> {
            Ok("fresh".to_string())
        }
    }

    #[test]
    fn test_headers_prefer_session_token() {
        let store = RestStore::new(RestStoreConfig::new("http://localhost/rest/v1/", "anon")).unwrap();
        assert_eq!(store.base_url(), "http://localhost/rest/v1");

        let headers = store.headers().unwrap();
        assert_eq!(headers["apikey"], "anon");
        assert_eq!(headers[AUTHORIZATION], "Bearer anon");

        store.set_token("session");
        let headers = store.headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer session");
    }

    #[tokio::test]
    async fn test_refresh_without_refresher_is_unauthorized() {
        let store = RestStore::new(RestStoreConfig::new("http://localhost", "anon")).unwrap();
        let err = store.refresh_session().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_refresh_installs_new_token() {
        let store = RestStore::new(RestStoreConfig::new("http://localhost", "anon"))
            .unwrap()
            .with_session_refresher(Arc::new(FixedToken));
        store.refresh_session().await.unwrap();
        assert_eq!(store.headers().unwrap()[AUTHORIZATION], "Bearer fresh");
    }
}
