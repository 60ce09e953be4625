use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const KLINE_IMPORT_JOB: &str = "kline-import";
pub const PROFIT_ANALYSIS_JOB: &str = "profit-analysis";

/// The `{code, message, data}` wrapper most endpoints answer with.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(code: i64, data: T) -> Self {
        Self {
            code,
            message: "ok".to_string(),
            data,
        }
    }
}

fn envelope_error(code: i64, message: &str) -> Json<Envelope<Value>> {
    Json(Envelope {
        code,
        message: message.to_string(),
        data: Value::Null,
    })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: u64,
    pub job_name: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub total_count: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub duration_ms: Option<u64>,
}

#[derive(Default)]
pub struct Store {
    executions: Vec<Execution>,
}

impl Store {
    fn record(&mut self, job_name: &str, total: u64, success: u64, skipped: u64) -> Execution {
        let id = self.executions.len() as u64 + 1;
        let execution = Execution {
            id,
            job_name: job_name.to_string(),
            status: "SUCCESS".to_string(),
            started_at: format!("2025-01-02T15:{:02}:00", id % 60),
            completed_at: Some(format!("2025-01-02T15:{:02}:30", id % 60)),
            total_count: total,
            success_count: success,
            failed_count: total - success - skipped,
            skipped_count: skipped,
            duration_ms: Some(30_000),
        };
        self.executions.push(execution.clone());
        execution
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/stock", get(single_stock))
        .route("/stock/trade-date", get(trade_date_query))
        .route("/stock/price-compare", get(price_compare))
        .route("/scheduler/jobs", get(job_list))
        .route("/scheduler/trigger-kline-import", post(trigger_kline_import))
        .route("/scheduler/trigger-profit-analysis", post(trigger_profit_analysis))
        .route("/scheduler/history", get(execution_history))
        .route("/scheduler/history/{id}", get(execution_detail))
        .route("/scheduler/latest/{job_name}", get(latest_execution))
        .route("/debug/status/{status}", get(debug_status))
        .route("/debug/slow/{millis}", get(debug_slow))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock market backend listening");
    }
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub code: Option<String>,
    pub source: Option<String>,
    pub raw_only: Option<bool>,
}

struct Quote {
    code: &'static str,
    name: &'static str,
    price: f64,
    change_pct: f64,
}

static QUOTES: [Quote; 3] = [
    Quote { code: "600000", name: "浦发银行", price: 10.52, change_pct: 1.25 },
    Quote { code: "000001", name: "平安银行", price: 11.08, change_pct: -0.36 },
    Quote { code: "300750", name: "宁德时代", price: 251.3, change_pct: 10.0 },
];

fn find_quote(code: &str) -> Option<&'static Quote> {
    QUOTES.iter().find(|q| q.code == code)
}

async fn single_stock(Query(query): Query<StockQuery>) -> Response {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "code is required"})),
        )
            .into_response();
    };
    let Some(quote) = find_quote(&code) else {
        return envelope_error(404, "stock not found").into_response();
    };
    let data = json!({
        "f57": quote.code,
        "f58": quote.name,
        "f43": quote.price,
        "f170": quote.change_pct,
        "f50": 1.05,
        "f162": 5.43,
        "f167": 0.48,
        "f191": 23.5,
        "f137": 12_500_000.0,
    });
    let source = query.source.unwrap_or_else(|| "em".to_string());
    let payload = json!({"source": source, "code": quote.code, "data": data});
    // raw_only skips the envelope entirely.
    if query.raw_only.unwrap_or(false) {
        return Json(payload).into_response();
    }
    Json(Envelope::ok(0, payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub trade_date: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

/// Page window over `total` rows, plus the page count.
fn page_window(total: usize, page: u32, page_size: u32) -> (std::ops::Range<usize>, u32) {
    let page_size = page_size.max(1) as usize;
    let total_pages = total.div_ceil(page_size) as u32;
    let start = (page.max(1) as usize - 1) * page_size;
    let start = start.min(total);
    let end = (start + page_size).min(total);
    (start..end, total_pages)
}

const MARKET_DAY: &str = "2025-01-02";

/// Bare (non-enveloped) paginated payload.
async fn trade_date_query(Query(query): Query<PageQuery>) -> Json<Value> {
    let rows: Vec<Value> = if query.trade_date == MARKET_DAY {
        QUOTES
            .iter()
            .map(|q| {
                json!({
                    "stock_code": q.code,
                    "stock_name": q.name,
                    "latest_price": format!("{:.2}", q.price),
                    "close_price": null,
                    "change_pct": format!("{:.2}", q.change_pct),
                    "volume_ratio": "1.05",
                    "turnover_rate": "0.87",
                    "bid_ask_ratio": "23.50",
                    "main_force_inflow": "12500000.00",
                    "created_at": format!("{MARKET_DAY}T15:00:00"),
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    let (window, total_pages) = page_window(rows.len(), query.page, query.page_size);
    Json(json!({
        "data": rows[window].to_vec(),
        "total": rows.len(),
        "page": query.page,
        "page_size": query.page_size,
        "total_pages": total_pages,
    }))
}

/// Limit-up closes grade A.
fn grade(quote: &Quote) -> &'static str {
    if quote.change_pct >= 10.0 {
        "A"
    } else {
        "B"
    }
}

async fn price_compare(Query(query): Query<PageQuery>) -> Json<Envelope<Value>> {
    let known = query.trade_date == MARKET_DAY;
    let date = known.then_some(MARKET_DAY);
    let rows: Vec<Value> = if known {
        QUOTES
            .iter()
            .map(|q| {
                json!({
                    "stock_code": q.code,
                    "stock_name": q.name,
                    "latest_price": format!("{:.2}", q.price),
                    "open_price": format!("{:.2}", q.price * 0.98),
                    "high_price": format!("{:.2}", q.price * 1.02),
                    "low_price": format!("{:.2}", q.price * 0.97),
                    "close_price": format!("{:.2}", q.price),
                    "grade": grade(q),
                    "created_at": format!("{MARKET_DAY}T15:00:00"),
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    let (window, total_pages) = page_window(rows.len(), query.page, query.page_size);
    Json(Envelope::ok(
        200,
        json!({
            "data": rows[window].to_vec(),
            "total": rows.len(),
            "page": query.page,
            "page_size": query.page_size,
            "total_pages": total_pages,
            "snapshot_date": date,
            "trade_date": date,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Bare (non-enveloped) list.
async fn job_list() -> Json<Value> {
    Json(json!([
        {
            "name": KLINE_IMPORT_JOB,
            "displayName": "K-line import",
            "description": "Imports daily K-line data for tracked stocks",
            "schedule": "0 30 15 * * MON-FRI",
            "enabled": true
        },
        {
            "name": PROFIT_ANALYSIS_JOB,
            "displayName": "Profit analysis",
            "description": "Scores limit-up snapshots against later prices",
            "schedule": "0 0 16 * * MON-FRI",
            "enabled": true
        }
    ]))
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty())
}

async fn trigger_kline_import(State(db): State<Db>, headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return envelope_error(401, "unauthorized").into_response();
    }
    let total = QUOTES.len() as u64;
    db.write().await.record(KLINE_IMPORT_JOB, total, total, 0);
    let details: Vec<Value> = QUOTES
        .iter()
        .map(|q| json!({"stockCode": q.code, "importedCount": 120, "success": true}))
        .collect();
    Json(Envelope::ok(
        200,
        json!({
            "success": true,
            "message": "K-line import finished",
            "totalStocks": total,
            "successCount": total,
            "failedCount": 0,
            "details": details,
        }),
    ))
    .into_response()
}

async fn trigger_profit_analysis(State(db): State<Db>, headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return envelope_error(401, "unauthorized").into_response();
    }
    let total = QUOTES.len() as u64;
    db.write().await.record(PROFIT_ANALYSIS_JOB, total, total - 1, 1);
    let details: Vec<Value> = QUOTES
        .iter()
        .map(|q| {
            json!({
                "stockCode": q.code,
                "stockName": q.name,
                "profitRate": q.change_pct / 100.0,
                "success": true,
            })
        })
        .collect();
    Json(Envelope::ok(
        200,
        json!({
            "success": true,
            "message": "Profit analysis finished",
            "totalSnapshots": total,
            "analyzedCount": total - 1,
            "skippedCount": 1,
            "noKlineCount": 0,
            "details": details,
        }),
    ))
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub job_name: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

async fn execution_history(
    State(db): State<Db>,
    Query(query): Query<HistoryQuery>,
) -> Json<Envelope<Value>> {
    let store = db.read().await;
    let matching: Vec<&Execution> = store
        .executions
        .iter()
        .rev()
        .filter(|e| query.job_name.as_ref().map_or(true, |j| &e.job_name == j))
        .filter(|e| query.status.as_ref().map_or(true, |s| &e.status == s))
        .collect();
    let (window, _) = page_window(matching.len(), query.page, query.page_size);
    Json(Envelope::ok(
        0,
        json!({
            "total": matching.len(),
            "page": query.page,
            "pageSize": query.page_size,
            "items": matching[window].to_vec(),
        }),
    ))
}

/// Unknown ids get a plain-text 404 with no envelope.
async fn execution_detail(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let store = db.read().await;
    match store.executions.iter().find(|e| e.id == id) {
        Some(execution) => Json(Envelope::ok(0, execution.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

async fn latest_execution(State(db): State<Db>, Path(job_name): Path<String>) -> Response {
    if job_name != KLINE_IMPORT_JOB && job_name != PROFIT_ANALYSIS_JOB {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("unknown job: {job_name}")})),
        )
            .into_response();
    }
    let store = db.read().await;
    match store.executions.iter().rev().find(|e| e.job_name == job_name) {
        Some(execution) => Json(Envelope::ok(0, execution.clone())).into_response(),
        None => envelope_error(404, "no executions yet").into_response(),
    }
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

async fn debug_status(Path(status): Path<u16>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let text = status.canonical_reason().unwrap_or("Error");
    (status, text.to_string()).into_response()
}

async fn debug_slow(Path(millis): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(json!({"slept": millis}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_all_fields() {
        let json = serde_json::to_value(Envelope::ok(0, json!({"f57": "600000"}))).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["f57"], "600000");
    }

    #[test]
    fn execution_uses_camel_case() {
        let mut store = Store::default();
        let execution = store.record(KLINE_IMPORT_JOB, 3, 3, 0);
        let json = serde_json::to_value(&execution).unwrap();
        assert_eq!(json["jobName"], KLINE_IMPORT_JOB);
        assert_eq!(json["successCount"], 3);
        assert_eq!(json["id"], 1);
    }

    #[test]
    fn record_assigns_sequential_ids() {
        let mut store = Store::default();
        store.record(KLINE_IMPORT_JOB, 3, 3, 0);
        let second = store.record(PROFIT_ANALYSIS_JOB, 3, 2, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.failed_count, 0);
    }

    #[test]
    fn page_window_clamps_to_bounds() {
        assert_eq!(page_window(3, 1, 2), (0..2, 2));
        assert_eq!(page_window(3, 2, 2), (2..3, 2));
        assert_eq!(page_window(3, 5, 2), (3..3, 2));
        assert_eq!(page_window(0, 1, 20), (0..0, 0));
        assert_eq!(page_window(3, 0, 0), (0..1, 3));
    }

    #[test]
    fn bearer_check_requires_a_token() {
        let mut headers = HeaderMap::new();
        assert!(!has_bearer(&headers));
        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(!has_bearer(&headers));
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert!(has_bearer(&headers));
    }

    #[test]
    fn stock_query_fields_are_optional() {
        let query: StockQuery = serde_json::from_str("{}").unwrap();
        assert!(query.code.is_none());
        assert!(query.raw_only.is_none());
    }
}
