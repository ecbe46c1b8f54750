use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::transport::HttpTransport;
use crate::config::AppConfig;
use crate::error::{BoardError, BoardResult, TransportError};
use crate::models::cache::TtlCache;
use crate::models::record::{ApiEnvelope, FieldsPage, RecordsPage};

pub const TENANT_ACCESS_TOKEN_KEY: &str = "feishu:tenant_access_token";
pub const TABLE_FIELDS_KEY: &str = "feishu:table_fields";
pub const TABLE_RECORDS_KEY: &str = "feishu:table_records";

pub const RECORDS_PAGE_SIZE: u32 = 500;

/// What the upstream client keeps in the shared cache.
#[derive(Debug, Clone)]
pub enum CachedResource {
    Token(String),
    Fields(Arc<FieldsPage>),
    Records(Arc<RecordsPage>),
}

pub type ResourceCache = TtlCache<CachedResource>;

pub struct FeishuApi {
    config: Arc<AppConfig>,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResourceCache>,
}

impl FeishuApi {
    pub fn new(
        config: Arc<AppConfig>,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ResourceCache>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Returns the tenant access token, exchanging app credentials for a new
    /// one when the cached token has left its fresh window. The upstream
    /// `expire` is logged only; refresh cadence is the cache's.
    pub async fn get_tenant_access_token(&self) -> BoardResult<String> {
        if let Some(CachedResource::Token(token)) = self.cache.get(TENANT_ACCESS_TOKEN_KEY, false) {
            return Ok(token);
        }

        info!("Fetching new tenant_access_token");
        let url = format!(
            "{}/auth/v3/tenant_access_token/internal",
            self.config.api_base_url
        );
        let body = json!({
            "app_id": self.config.app_id,
            "app_secret": self.config.app_secret,
        });

        let started = Instant::now();
        let response = self
            .transport
            .post_json(&url, None, &body)
            .await
            .map_err(|err| transport_failure(err, BoardError::Auth))?;
        debug!(
            "Fetch tenant_access_token completed in {}ms",
            started.elapsed().as_millis()
        );

        let code = response
            .get("code")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                BoardError::MalformedResponse("token response has no numeric code".to_string())
            })?;
        if code != 0 {
            let msg = response.get("msg").and_then(Value::as_str).unwrap_or_default();
            return Err(BoardError::Auth(format!("{}, code: {}", msg, code)));
        }

        // The token may sit at the root or under `data`.
        let token_data = match response.get("data") {
            Some(data) if data.is_object() => data,
            _ => &response,
        };
        let token = token_data
            .get("tenant_access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BoardError::Auth("no tenant_access_token in response".to_string()))?
            .to_string();
        if let Some(expire) = token_data.get("expire").and_then(Value::as_u64) {
            debug!("Upstream declared token lifetime of {}s", expire);
        }

        self.cache.set(
            TENANT_ACCESS_TOKEN_KEY,
            CachedResource::Token(token.clone()),
            true,
        );
        Ok(token)
    }

    /// Table schema. Serves stale cache entries since the schema rarely changes.
    pub async fn get_table_fields(&self) -> BoardResult<Arc<FieldsPage>> {
        if let Some(CachedResource::Fields(fields)) = self.cache.get(TABLE_FIELDS_KEY, true) {
            return Ok(fields);
        }

        let token = self.get_tenant_access_token().await?;
        let url = format!(
            "{}/bitable/v1/apps/{}/tables/{}/fields?view_id={}",
            self.config.api_base_url,
            self.config.app_token,
            self.config.table_id,
            self.config.view_id
        );

        info!("Fetching table fields");
        let started = Instant::now();
        let response = self
            .transport
            .get_json(&url, Some(&token))
            .await
            .map_err(|err| transport_failure(err, BoardError::Upstream))?;
        debug!(
            "Fetch table fields completed in {}ms",
            started.elapsed().as_millis()
        );

        let fields: Arc<FieldsPage> = Arc::new(unwrap_envelope(response, "table fields")?);
        self.cache
            .set(TABLE_FIELDS_KEY, CachedResource::Fields(fields.clone()), true);
        Ok(fields)
    }

    /// First page (up to 500 rows) of the configured view. Serves stale cache
    /// entries.
    pub async fn get_table_records(&self) -> BoardResult<Arc<RecordsPage>> {
        if let Some(CachedResource::Records(records)) = self.cache.get(TABLE_RECORDS_KEY, true) {
            return Ok(records);
        }

        let token = self.get_tenant_access_token().await?;
        let url = format!(
            "{}/bitable/v1/apps/{}/tables/{}/records/search?page_size={}",
            self.config.api_base_url,
            self.config.app_token,
            self.config.table_id,
            RECORDS_PAGE_SIZE
        );
        let body = json!({ "view_id": self.config.view_id });

        info!("Fetching table records");
        let started = Instant::now();
        let response = self
            .transport
            .post_json(&url, Some(&token), &body)
            .await
            .map_err(|err| transport_failure(err, BoardError::Upstream))?;
        debug!(
            "Fetch table records completed in {}ms",
            started.elapsed().as_millis()
        );

        let records: Arc<RecordsPage> = Arc::new(unwrap_envelope(response, "table records")?);
        debug!(
            "Parsed {} records (total {}, has_more {})",
            records.items.len(),
            records.total,
            records.has_more
        );
        self.cache.set(
            TABLE_RECORDS_KEY,
            CachedResource::Records(records.clone()),
            true,
        );
        Ok(records)
    }

    /// Drops cached fields and records and re-fetches both in the background.
    /// Failures are logged, never returned.
    pub fn refresh_cache(self: &Arc<Self>) -> RefreshTasks {
        info!("Refreshing cache");
        self.cache.delete(TABLE_FIELDS_KEY);
        self.cache.delete(TABLE_RECORDS_KEY);

        let api = Arc::clone(self);
        let fields = tokio::spawn(async move {
            if let Err(e) = api.get_table_fields().await {
                error!("Failed to refresh table fields: {}", e);
            }
        });
        let api = Arc::clone(self);
        let records = tokio::spawn(async move {
            if let Err(e) = api.get_table_records().await {
                error!("Failed to refresh table records: {}", e);
            }
        });

        RefreshTasks {
            handles: vec![fields, records],
        }
    }
}

/// Background re-population started by [`FeishuApi::refresh_cache`]. Dropping
/// it detaches the tasks.
pub struct RefreshTasks {
    handles: Vec<JoinHandle<()>>,
}

impl RefreshTasks {
    pub async fn finished(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Cache refresh task aborted: {}", e);
            }
        }
    }
}

fn transport_failure(err: TransportError, kind: fn(String) -> BoardError) -> BoardError {
    match err {
        TransportError::InvalidJson(detail) => BoardError::MalformedResponse(detail),
        other => kind(other.to_string()),
    }
}

fn unwrap_envelope<T: DeserializeOwned>(response: Value, what: &str) -> BoardResult<T> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(response)
        .map_err(|e| BoardError::MalformedResponse(format!("{} response: {}", what, e)))?;

    if envelope.code != 0 {
        return Err(BoardError::Upstream(format!(
            "failed to get {}: {} (code {})",
            what, envelope.msg, envelope.code
        )));
    }

    let data = envelope
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| BoardError::Upstream(format!("no data in {} response", what)))?;

    serde_json::from_value(data)
        .map_err(|e| BoardError::MalformedResponse(format!("{} payload: {}", what, e)))
}
