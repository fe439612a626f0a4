// src/data/source.rs
//! Where the two datasets come from. Each source wraps an [`Origin`]
//! (inline fixture text, local file, or HTTP URL) and a parser.

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::path::PathBuf;
use std::time::Duration;

use crate::data::geo::{parse_features, DEFAULT_OBJECT};
use crate::data::tabular::parse_csv;
use crate::data::{GeoFeature, RawRecord};
use crate::error::LoadError;

#[async_trait]
pub trait TabularSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<RawRecord>, LoadError>;
    fn name(&self) -> &str;
}

#[async_trait]
pub trait GeoSource: Send + Sync {
    async fn fetch_features(&self) -> Result<Vec<GeoFeature>, LoadError>;
    fn name(&self) -> &str;
}

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits for HTTP origins. `request` covers the whole exchange, body included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            request: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HttpTimeouts {
    fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("labor-gap-scenes/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(self.connect)
            .timeout(self.request)
            .build()
    }
}

#[derive(Debug, Clone)]
pub enum Origin {
    Inline(String),
    File(PathBuf),
    Http { url: String, timeouts: HttpTimeouts },
}

impl Origin {
    /// `http(s)://…` is fetched over the network, anything else is a file path.
    pub fn from_location(location: &str) -> Self {
        Self::with_timeouts(location, HttpTimeouts::default())
    }

    pub fn with_timeouts(location: &str, timeouts: HttpTimeouts) -> Self {
        let loc = location.trim();
        if loc.starts_with("http://") || loc.starts_with("https://") {
            Self::Http {
                url: loc.to_string(),
                timeouts,
            }
        } else {
            Self::File(PathBuf::from(loc))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Inline(_) => "inline".to_string(),
            Self::File(p) => p.display().to_string(),
            Self::Http { url, .. } => url.clone(),
        }
    }

    async fn read_text(&self, source: &str) -> Result<String, LoadError> {
        counter!("loader_fetch_total", "source" => source.to_string()).increment(1);
        match self {
            Self::Inline(s) => Ok(s.clone()),
            Self::File(p) => tokio::fs::read_to_string(p)
                .await
                .map_err(|e| LoadError::fetch(p.display().to_string(), e)),
            Self::Http { url, timeouts } => {
                let fail = |e: reqwest::Error| {
                    tracing::warn!(
                        target: "loader",
                        error = ?e,
                        timed_out = e.is_timeout(),
                        source,
                        "source http error"
                    );
                    LoadError::fetch(url.clone(), e)
                };
                let client = timeouts.client().map_err(fail)?;
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(fail)?;
                resp.text().await.map_err(fail)
            }
        }
    }
}

/// Long-format labour CSV.
pub struct CsvSource {
    origin: Origin,
}

impl CsvSource {
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }

    pub fn from_location(location: &str) -> Self {
        Self::new(Origin::from_location(location))
    }

    pub fn with_timeouts(location: &str, timeouts: HttpTimeouts) -> Self {
        Self::new(Origin::with_timeouts(location, timeouts))
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self::new(Origin::Inline(s.to_string()))
    }
}

#[async_trait]
impl TabularSource for CsvSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRecord>, LoadError> {
        let text = self.origin.read_text(self.name()).await?;
        let t0 = std::time::Instant::now();
        let rows = parse_csv(&self.origin.describe(), &text)?;
        histogram!("loader_parse_ms", "source" => "tabular").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(rows)
    }

    fn name(&self) -> &str {
        "tabular"
    }
}

/// World-atlas topology (or a GeoJSON FeatureCollection).
pub struct TopoJsonSource {
    origin: Origin,
    object: String,
}

impl TopoJsonSource {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            object: DEFAULT_OBJECT.to_string(),
        }
    }

    pub fn from_location(location: &str) -> Self {
        Self::new(Origin::from_location(location))
    }

    pub fn with_timeouts(location: &str, timeouts: HttpTimeouts) -> Self {
        Self::new(Origin::with_timeouts(location, timeouts))
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self::new(Origin::Inline(s.to_string()))
    }

    /// Topology object holding the country geometries.
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = object.into();
        self
    }
}

#[async_trait]
impl GeoSource for TopoJsonSource {
    async fn fetch_features(&self) -> Result<Vec<GeoFeature>, LoadError> {
        let text = self.origin.read_text(self.name()).await?;
        let t0 = std::time::Instant::now();
        let features = parse_features(&self.origin.describe(), &text, &self.object)?;
        histogram!("loader_parse_ms", "source" => "geo").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(features)
    }

    fn name(&self) -> &str {
        "geo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_selects_origin() {
        assert!(matches!(
            Origin::from_location("https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json"),
            Origin::Http { .. }
        ));
        assert!(matches!(
            Origin::from_location("data/labor_gap_long.csv"),
            Origin::File(_)
        ));
        match Origin::from_location("http://127.0.0.1/x.csv") {
            Origin::Http { timeouts, .. } => assert_eq!(timeouts, HttpTimeouts::default()),
            other => panic!("expected http origin, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let src = CsvSource::from_location("definitely/not/here.csv");
        let err = src.fetch_rows().await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }

    #[tokio::test]
    async fn inline_fixture_parses() {
        let src = CsvSource::from_fixture_str("Country Name,Year,Ratio\nQatar,2021,95.2\n");
        let rows = src.fetch_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
