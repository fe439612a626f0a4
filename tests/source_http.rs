// tests/source_http.rs
//
// URL sources against a local server that accepts connections and never
// answers. The loader must settle with a fetch error, not hang.

use std::sync::Arc;
use std::time::Duration;

use labor_gap_scenes::data::{CsvSource, HttpTimeouts, TabularSource, TopoJsonSource};
use labor_gap_scenes::keys::AliasTable;
use labor_gap_scenes::{DataLoader, LoadError};
use tokio::net::TcpListener;

const GEO: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"name":"Qatar"},"geometry":{"type":"Polygon","coordinates":[]}}
]}"#;

/// Accepts connections and holds them open without writing a byte.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}/labor.csv")
}

fn short() -> HttpTimeouts {
    HttpTimeouts {
        connect: Duration::from_millis(500),
        request: Duration::from_millis(300),
    }
}

#[tokio::test]
async fn silent_tabular_endpoint_is_a_fetch_error() {
    let url = silent_server().await;
    let src = CsvSource::with_timeouts(&url, short());

    let res = tokio::time::timeout(Duration::from_secs(5), src.fetch_rows())
        .await
        .expect("request timeout did not fire");
    match res {
        Err(LoadError::Fetch { origin, .. }) => assert_eq!(origin, url),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn loader_settles_and_caches_the_timeout() {
    let url = silent_server().await;
    let loader = DataLoader::new(
        Arc::new(CsvSource::with_timeouts(&url, short())),
        Arc::new(TopoJsonSource::from_fixture_str(GEO)),
        Arc::new(AliasTable::default_seed()),
    );

    let first = tokio::time::timeout(Duration::from_secs(5), loader.load())
        .await
        .expect("load stayed pending")
        .unwrap_err();
    assert!(matches!(first, LoadError::Fetch { .. }));

    // Cached failure: answered immediately, no second request.
    let second = tokio::time::timeout(Duration::from_millis(100), loader.load())
        .await
        .expect("cached failure was not returned")
        .unwrap_err();
    assert_eq!(first, second);
}
