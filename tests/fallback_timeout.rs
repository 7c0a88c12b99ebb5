//! Fallback timeout behavior against a slow order endpoint.
//!
//! The command timeout is process-wide, so these tests live in their own
//! binary and take `SERIAL` before touching it. Clients built without their
//! own `fallback_timeout` read the process-wide value on every call.

use std::sync::Arc;
use std::time::Duration;

use armature_rest_client::prelude::*;
use armature_rest_client::{default_timeout, set_default_timeout};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static SERIAL: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug, Default, Serialize)]
pub struct Order {
    pub product: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub return_code: Option<i32>,
    pub return_code_desc: Option<String>,
}

#[rest_api]
#[async_trait]
pub trait OrderSlowApi: Send + Sync {
    #[request_line("POST /swloworders/")]
    #[headers("Content-Type: application/json")]
    async fn process(&self, order: Order) -> Result<OrderResponse>;
}

struct OfflineOrders;

#[async_trait]
impl OrderSlowApi for OfflineOrders {
    async fn process(&self, _order: Order) -> Result<OrderResponse> {
        Ok(OrderResponse {
            return_code: Some(-1),
            return_code_desc: None,
        })
    }
}

async fn slow_service(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/swloworders/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "returnCode": 1,
                    "returnCodeDesc": "Todo Bien :)"
                }))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

fn offline_client(server: &MockServer) -> RestClient<dyn OrderSlowApi> {
    RestClient::<dyn OrderSlowApi>::get().url(format!("{}/api/", server.uri()))
}

#[tokio::test]
async fn test_generous_timeout_waits_for_slow_response() {
    let _serial = SERIAL.lock().await;
    let server = slow_service(Duration::from_millis(1500)).await;

    let orders = RestClient::<dyn OrderSlowApi>::get()
        .url(format!("{}/api/", server.uri()))
        .fallback_timeout(Duration::from_millis(5000))
        .build_with_fallback(Arc::new(OfflineOrders))
        .unwrap();

    assert_eq!(
        orders.command().unwrap().timeout(),
        Duration::from_millis(5000)
    );

    let response = orders.process(Order::default()).await.unwrap();
    assert_eq!(response.return_code, Some(1));
    assert_eq!(response.return_code_desc.as_deref(), Some("Todo Bien :)"));
}

#[tokio::test]
async fn test_short_timeout_answers_with_fallback() {
    let _serial = SERIAL.lock().await;
    let server = slow_service(Duration::from_millis(1500)).await;

    let orders = RestClient::<dyn OrderSlowApi>::get()
        .url(format!("{}/api/", server.uri()))
        .fallback_timeout(Duration::from_millis(200))
        .build_with_fallback(Arc::new(OfflineOrders))
        .unwrap();

    assert_eq!(
        orders.command().unwrap().timeout(),
        Duration::from_millis(200)
    );

    let response = orders.process(Order::default()).await.unwrap();
    assert_eq!(response.return_code, Some(-1));
}

#[tokio::test]
async fn test_factory_receives_timeout_cause() {
    let _serial = SERIAL.lock().await;
    let server = slow_service(Duration::from_millis(1500)).await;

    let orders = RestClient::<dyn OrderSlowApi>::get()
        .url(format!("{}/api/", server.uri()))
        .fallback_timeout(Duration::from_millis(200))
        .build_with_fallback_factory(|cause: &RestClientError| -> Arc<dyn OrderSlowApi> {
            assert!(cause.is_timeout());
            Arc::new(OfflineOrders)
        })
        .unwrap();

    let response = orders.process(Order::default()).await.unwrap();
    assert_eq!(response.return_code, Some(-1));
}

#[test]
fn test_set_default_timeout_returns_applied_value() {
    let _serial = SERIAL.blocking_lock();
    let applied = set_default_timeout(Duration::from_millis(750));
    assert_eq!(applied, Duration::from_millis(750));
    assert!(default_timeout() > Duration::ZERO);
}

#[tokio::test]
async fn test_existing_client_adopts_later_timeout() {
    let _serial = SERIAL.lock().await;
    set_default_timeout(Duration::from_millis(1000));
    let server = slow_service(Duration::from_millis(1500)).await;

    let orders = offline_client(&server)
        .build_with_fallback(Arc::new(OfflineOrders))
        .unwrap();
    assert_eq!(
        orders.command().unwrap().timeout(),
        Duration::from_millis(1000)
    );

    let _generous = offline_client(&server)
        .fallback_timeout(Duration::from_millis(5000))
        .build_with_fallback(Arc::new(OfflineOrders))
        .unwrap();

    assert_eq!(
        orders.command().unwrap().timeout(),
        Duration::from_millis(5000)
    );
    let response = orders.process(Order::default()).await.unwrap();
    assert_eq!(response.return_code, Some(1));
}

#[tokio::test]
async fn test_client_without_timeout_uses_value_set_by_other_builder() {
    let _serial = SERIAL.lock().await;
    let server = slow_service(Duration::from_millis(1500)).await;

    let _short = offline_client(&server)
        .fallback_timeout(Duration::from_millis(200))
        .build_with_fallback(Arc::new(OfflineOrders))
        .unwrap();
    let orders = offline_client(&server)
        .build_with_fallback_factory(|_: &RestClientError| -> Arc<dyn OrderSlowApi> {
            Arc::new(OfflineOrders)
        })
        .unwrap();

    assert!(orders.command().unwrap().follows_default());
    assert_eq!(
        orders.command().unwrap().timeout(),
        Duration::from_millis(200)
    );
    let response = orders.process(Order::default()).await.unwrap();
    assert_eq!(response.return_code, Some(-1));
}
