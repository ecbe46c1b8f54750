//! Process configuration, read once from the environment at start-up.

use std::net::SocketAddr;

use crate::error::ConfigError;
use crate::services::aggregator::StatusPrecedence;

pub const DEFAULT_API_BASE_URL: &str = "https://open.feishu.cn/open-apis";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_id: String,
    pub app_secret: String,
    pub app_token: String,
    pub table_id: String,
    pub view_id: String,
    /// Public form URL shown by the UI; empty when not configured.
    pub submit_url: String,
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub status_precedence: StatusPrecedence,
}

impl AppConfig {
    /// Environment variables:
    /// - `FEISHU_APP_ID`, `FEISHU_APP_SECRET`, `FEISHU_APP_TOKEN`,
    ///   `FEISHU_TABLE_ID`, `FEISHU_VIEW_ID`: required
    /// - `SUBMIT_URL` (or `NEXT_PUBLIC_SUBMIT_URL`): default empty
    /// - `FEISHU_API_BASE_URL`: default `https://open.feishu.cn/open-apis`
    /// - `BIND_ADDR`: default `0.0.0.0:3000`
    /// - `STATUS_PRECEDENCE`: `legacy` (default) or `severity`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| non_empty(name).ok_or(ConfigError::Missing(name));

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: err.to_string(),
            })?;

        let status_precedence = match non_empty("STATUS_PRECEDENCE") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                name: "STATUS_PRECEDENCE",
                reason,
            })?,
            None => StatusPrecedence::default(),
        };

        Ok(Self {
            app_id: required("FEISHU_APP_ID")?,
            app_secret: required("FEISHU_APP_SECRET")?,
            app_token: required("FEISHU_APP_TOKEN")?,
            table_id: required("FEISHU_TABLE_ID")?,
            view_id: required("FEISHU_VIEW_ID")?,
            submit_url: non_empty("SUBMIT_URL")
                .or_else(|| non_empty("NEXT_PUBLIC_SUBMIT_URL"))
                .unwrap_or_default(),
            api_base_url: non_empty("FEISHU_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            bind_addr,
            status_precedence,
        })
    }
}
