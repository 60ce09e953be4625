//! Payload and parameter models for the market backend.
//!
//! # Design
//! Field names follow the wire format: stock and screening payloads are
//! `snake_case`, scheduler payloads are `camelCase`. Prices in the screening
//! tables arrive as decimal strings and are kept as strings so no precision
//! is lost before display.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Single stock
// ---------------------------------------------------------------------------

/// Quote fields, keyed by the upstream field ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStockData {
    /// Code.
    pub f57: String,
    /// Name.
    pub f58: String,
    /// Latest price.
    pub f43: f64,
    /// Change percent.
    pub f170: f64,
    /// Volume ratio.
    pub f50: f64,
    /// Dynamic P/E.
    pub f162: f64,
    /// P/B.
    pub f167: f64,
    /// Bid/ask ratio.
    pub f191: f64,
    /// Main-force net inflow.
    pub f137: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStockResponse {
    pub source: String,
    pub code: String,
    pub data: SingleStockData,
}

/// Upstream quote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockSource {
    Em,
    Ak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSingleStockParams {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StockSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_only: Option<bool>,
}

impl FetchSingleStockParams {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            source: None,
            raw_only: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trade-date query and price comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDateQueryRequest {
    pub trade_date: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDateQueryItem {
    pub stock_code: String,
    pub stock_name: String,
    pub latest_price: String,
    pub close_price: Option<String>,
    pub change_pct: String,
    pub volume_ratio: String,
    pub turnover_rate: String,
    pub bid_ask_ratio: String,
    pub main_force_inflow: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDateQueryResponse {
    pub data: Vec<TradeDateQueryItem>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCompareRequest {
    pub trade_date: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCompareItem {
    pub stock_code: String,
    pub stock_name: String,
    pub latest_price: String,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub close_price: String,
    pub grade: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCompareResponse {
    pub data: Vec<PriceCompareItem>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub snapshot_date: Option<String>,
    pub trade_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub schedule: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExecutionHistory {
    pub id: u64,
    pub job_name: String,
    pub status: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub total_count: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    /// Free-form, job specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetail {
    pub stock_code: String,
    pub imported_count: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerKlineResponse {
    pub success: bool,
    pub message: String,
    pub total_stocks: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub details: Vec<StockDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDetail {
    pub stock_code: String,
    pub stock_name: String,
    pub profit_rate: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerProfitAnalysisResponse {
    pub success: bool,
    pub message: String,
    pub total_snapshots: u64,
    pub analyzed_count: u64,
    pub skipped_count: u64,
    pub no_kline_count: u64,
    pub details: Vec<SnapshotDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQueryResponse {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<JobExecutionHistory>,
}
