//! `/dashboard` endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::DashboardStats;

impl ApiClient {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.send_json(ApiRequest::get("/dashboard/stats")).await
    }
}
