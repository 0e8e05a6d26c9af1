//! Spying: unmatched calls reach a real HTTP backend.

use std::sync::Arc;
use std::time::Duration;

use fetch_mock::interception::NetworkFetch;
use fetch_mock::{CallFilter, RouteConfig};

mod common;

#[tokio::test]
async fn test_spy_passes_unmatched_calls_to_network() {
    let addr = common::start_mock_backend(200, "from backend").await;
    let network = NetworkFetch::new(Duration::from_secs(5)).unwrap();

    let fm = common::sandbox().with_native_fetch(Arc::new(network));
    fm.mock("begin:http://mocked.invalid", 202u16, RouteConfig::default())
        .unwrap();
    fm.spy().unwrap();

    let mocked = fm
        .fetch("http://mocked.invalid/x", common::method("GET"))
        .await
        .unwrap();
    assert_eq!(mocked.status, 202);

    let real = fm
        .fetch(format!("http://{}/data", addr), common::method("GET"))
        .await
        .unwrap();
    assert_eq!(real.status, 200);
    assert_eq!(real.body.as_deref(), Some("from backend"));
    assert!(real.headers.get("x-backend").is_some());
    assert_eq!(fm.calls(CallFilter::Unmatched).len(), 1);
}

#[tokio::test]
async fn test_network_status_is_passed_through() {
    let addr = common::start_mock_backend(503, "down").await;
    let fm = common::sandbox()
        .with_native_fetch(Arc::new(NetworkFetch::new(Duration::from_secs(5)).unwrap()));
    fm.spy().unwrap();

    let response = fm
        .fetch(format!("http://{}/", addr), common::method("GET"))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
}
