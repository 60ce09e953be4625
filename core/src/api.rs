//! Typed call wrappers, one per backend endpoint.
//!
//! Each wrapper fixes the path and verb and declares the payload type. None of
//! them handle errors; whatever the client returns is passed straight back.

use crate::client::ApiClient;
use crate::error::NormalizedError;
use crate::request::RequestConfig;
use crate::transport::Transport;
use crate::types::{
    FetchSingleStockParams, HistoryQueryParams, HistoryQueryResponse, JobExecutionHistory, JobInfo,
    PriceCompareRequest, PriceCompareResponse, SingleStockResponse, TradeDateQueryRequest,
    TradeDateQueryResponse, TriggerKlineResponse, TriggerProfitAnalysisResponse,
};

/// Stock lookup and screening endpoints.
pub struct StockApi<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> StockApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// `GET /stock?code&source&raw_only`
    pub async fn fetch_single_stock(
        &self,
        params: &FetchSingleStockParams,
    ) -> Result<SingleStockResponse, NormalizedError> {
        self.client
            .get("/stock", RequestConfig::new().params(params))
            .await
    }

    /// `GET /stock/trade-date?trade_date&page&page_size`
    pub async fn query_trade_date(
        &self,
        params: &TradeDateQueryRequest,
    ) -> Result<TradeDateQueryResponse, NormalizedError> {
        self.client
            .get("/stock/trade-date", RequestConfig::new().params(params))
            .await
    }

    /// `GET /stock/price-compare?trade_date&page&page_size`
    pub async fn compare_prices(
        &self,
        params: &PriceCompareRequest,
    ) -> Result<PriceCompareResponse, NormalizedError> {
        self.client
            .get("/stock/price-compare", RequestConfig::new().params(params))
            .await
    }
}

/// Scheduler job control endpoints.
pub struct SchedulerApi<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> SchedulerApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub async fn trigger_kline_import(&self) -> Result<TriggerKlineResponse, NormalizedError> {
        self.client
            .post::<_, ()>("/scheduler/trigger-kline-import", None, RequestConfig::new())
            .await
    }

    pub async fn trigger_profit_analysis(
        &self,
    ) -> Result<TriggerProfitAnalysisResponse, NormalizedError> {
        self.client
            .post::<_, ()>("/scheduler/trigger-profit-analysis", None, RequestConfig::new())
            .await
    }

    pub async fn job_list(&self) -> Result<Vec<JobInfo>, NormalizedError> {
        self.client.get("/scheduler/jobs", RequestConfig::new()).await
    }

    pub async fn execution_history(
        &self,
        params: &HistoryQueryParams,
    ) -> Result<HistoryQueryResponse, NormalizedError> {
        self.client
            .get("/scheduler/history", RequestConfig::new().params(params))
            .await
    }

    pub async fn execution_detail(&self, id: u64) -> Result<JobExecutionHistory, NormalizedError> {
        self.client
            .get(&format!("/scheduler/history/{id}"), RequestConfig::new())
            .await
    }

    pub async fn latest_execution(
        &self,
        job_name: &str,
    ) -> Result<JobExecutionHistory, NormalizedError> {
        self.client
            .get(
                &format!("/scheduler/latest/{}", urlencoding::encode(job_name)),
                RequestConfig::new(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use std::sync::Mutex;

    /// Records the last request and answers with a fixed body.
    struct Recording {
        last: Mutex<Option<HttpRequest>>,
        body: &'static str,
    }

    impl Recording {
        fn new(body: &'static str) -> Self {
            Self {
                last: Mutex::new(None),
                body,
            }
        }

        fn last(&self) -> HttpRequest {
            self.last.lock().unwrap().clone().expect("no request recorded")
        }
    }

    impl Transport for Recording {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.last.lock().unwrap() = Some(request);
            Ok(HttpResponse::new(200, self.body))
        }
    }

    #[tokio::test]
    async fn fetch_single_stock_sends_query() {
        let client = ApiClient::new(
            ClientConfig::new("/api"),
            Recording::new(
                r#"{"code":0,"message":"ok","data":{"source":"em","code":"600000","data":
                {"f57":"600000","f58":"浦发银行","f43":10.5,"f170":1.2,"f50":0.9,
                 "f162":5.1,"f167":0.6,"f191":12.0,"f137":1000.0}}}"#,
            ),
        );
        let params = FetchSingleStockParams {
            raw_only: Some(false),
            ..FetchSingleStockParams::new("600000")
        };
        let stock = StockApi::new(&client).fetch_single_stock(&params).await.unwrap();
        assert_eq!(stock.code, "600000");
        assert_eq!(stock.data.f58, "浦发银行");

        let req = client_transport(&client).last();
        assert_eq!(req.url, "/api/stock");
        assert_eq!(
            req.query,
            vec![
                ("code".to_string(), "600000".to_string()),
                ("raw_only".to_string(), "false".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn scheduler_paths_are_fixed() {
        let client = ApiClient::new(
            ClientConfig::new("/api"),
            Recording::new(
                r#"{"id":3,"jobName":"kline-import","status":"SUCCESS","startedAt":"t",
                "totalCount":1,"successCount":1,"failedCount":0,"skippedCount":0}"#,
            ),
        );
        let api = SchedulerApi::new(&client);

        let detail = api.execution_detail(3).await.unwrap();
        assert_eq!(detail.id, 3);
        assert_eq!(client_transport(&client).last().path, "/scheduler/history/3");

        api.latest_execution("kline-import").await.unwrap();
        assert_eq!(
            client_transport(&client).last().url,
            "/api/scheduler/latest/kline-import"
        );
    }

    #[tokio::test]
    async fn job_name_is_a_single_path_segment() {
        let client = ApiClient::new(
            ClientConfig::new("/api"),
            Recording::new(
                r#"{"id":1,"jobName":"a/b","status":"SUCCESS","startedAt":"t",
                "totalCount":0,"successCount":0,"failedCount":0,"skippedCount":0}"#,
            ),
        );
        SchedulerApi::new(&client)
            .latest_execution("a/b?x=1#y")
            .await
            .unwrap();
        let req = client_transport(&client).last();
        assert_eq!(req.path, "/scheduler/latest/a%2Fb%3Fx%3D1%23y");
        assert!(req.query.is_empty());
    }

    #[tokio::test]
    async fn trigger_uses_post_without_body() {
        let client = ApiClient::new(
            ClientConfig::new("/api"),
            Recording::new(
                r#"{"code":200,"message":"ok","data":{"success":true,"message":"done",
                "totalStocks":0,"successCount":0,"failedCount":0,"details":[]}}"#,
            ),
        );
        let resp = SchedulerApi::new(&client).trigger_kline_import().await.unwrap();
        assert!(resp.success);
        let req = client_transport(&client).last();
        assert_eq!(req.method, crate::http::HttpMethod::Post);
        assert!(req.body.is_none());
    }

    fn client_transport(client: &ApiClient<Recording>) -> &Recording {
        client.transport()
    }
}
