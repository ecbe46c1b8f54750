use std::sync::Arc;

use tracing::{error, info};

use super::aggregator::{count_records, Aggregator};
use crate::api::feishu::{FeishuApi, RefreshTasks, ResourceCache};
use crate::api::transport::HttpTransport;
use crate::config::AppConfig;
use crate::error::BoardResult;
use crate::models::clock::Clock;
use crate::models::grid::{BoardData, DataResponse, DataStats};
use crate::models::record::FieldsPage;

/// Fetch → aggregate → respond. Holds no state between calls beyond the
/// shared cache inside the upstream client.
pub struct BoardService {
    api: Arc<FeishuApi>,
    aggregator: Aggregator,
    clock: Arc<dyn Clock>,
    submit_url: String,
}

impl BoardService {
    pub fn new(
        config: Arc<AppConfig>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(ResourceCache::with_clock(clock.clone()));
        let aggregator = Aggregator::new(config.status_precedence);
        let submit_url = config.submit_url.clone();
        Self {
            api: Arc::new(FeishuApi::new(config, transport, cache)),
            aggregator,
            clock,
            submit_url,
        }
    }

    pub fn api(&self) -> &Arc<FeishuApi> {
        &self.api
    }

    pub fn submit_url(&self) -> &str {
        &self.submit_url
    }

    /// Never fails: upstream errors become a `success: false` payload with an
    /// empty grid.
    pub async fn handle_get_data(&self) -> DataResponse {
        match self.fetch_board().await {
            Ok(data) => DataResponse::ok(data),
            Err(e) => {
                error!("Error fetching data from Feishu API: {}", e);
                DataResponse::failed(e.to_string())
            }
        }
    }

    pub async fn fetch_board(&self) -> BoardResult<BoardData> {
        let page = self.api.get_table_records().await?;
        let building_data = self.aggregator.aggregate(&page.items);

        // Grid keys are already ordered.
        let buildings: Vec<String> = building_data.keys().cloned().collect();
        let stats = DataStats {
            total_records: count_records(&building_data),
            last_update_time: self.clock.now_millis(),
        };
        info!(
            "Aggregated {} records into {} buildings",
            stats.total_records,
            buildings.len()
        );

        Ok(BoardData {
            buildings,
            building_data,
            stats,
        })
    }

    pub async fn table_fields(&self) -> BoardResult<Arc<FieldsPage>> {
        self.api.get_table_fields().await
    }

    pub fn refresh(&self) -> RefreshTasks {
        self.api.refresh_cache()
    }
}
