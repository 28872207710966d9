use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use tracing::{debug, warn};

use super::traits::ShipmentSource;
use super::wire::{parse_error_detail, parse_snapshot};
use crate::config::{PollerConfig, TRACK_PATH_SEGMENTS};
use crate::error::FetchError;
use crate::shipment::ShipmentSnapshot;

/// Tracking endpoint client: `GET <base>/api/v1/track/{id}`.
pub struct HttpShipmentSource {
    client: Client,
    base_url: Url,
    headers: HashMap<String, String>,
}

impl HttpShipmentSource {
    /// Build a client for `config.base_url` with the configured request timeout.
    pub fn new(config: &PollerConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url,
            headers: HashMap::new(),
        })
    }

    /// Extra headers sent with every request (e.g. an API key).
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// URL for one tracking id. The id is path-escaped as a single segment.
    pub fn track_url(&self, tracking_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::network("base url cannot carry a path"))?;
            segments
                .pop_if_empty()
                .extend(TRACK_PATH_SEGMENTS)
                .push(tracking_id);
        }
        Ok(url)
    }

    fn build_request(&self, url: Url) -> RequestBuilder {
        let mut req = self.client.get(url).header("Accept", "application/json");
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }
}

#[async_trait]
impl ShipmentSource for HttpShipmentSource {
    async fn fetch(&self, tracking_id: &str) -> Result<ShipmentSnapshot, FetchError> {
        if tracking_id.trim().is_empty() {
            return Err(FetchError::invalid_input("tracking id must not be empty"));
        }

        let url = self.track_url(tracking_id)?;
        let t0 = Instant::now();
        let resp = self.build_request(url).send().await.map_err(|e| {
            warn!("tracking request failed id={}: {}", tracking_id, e);
            FetchError::from(e)
        })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            warn!("tracking body read failed id={} status={}: {}", tracking_id, status.as_u16(), e);
            FetchError::from(e)
        })?;

        debug!(
            "tracking fetch id={} status={} bytes={} elapsed_ms={}",
            tracking_id,
            status.as_u16(),
            body.len(),
            t0.elapsed().as_millis()
        );

        if !status.is_success() {
            let err = FetchError::from_response(status.as_u16(), parse_error_detail(&body));
            warn!(
                "tracking fetch rejected id={} status={} kind={}: {}",
                tracking_id,
                status.as_u16(),
                err.kind,
                err.message
            );
            return Err(err);
        }

        parse_snapshot(&body, tracking_id)
    }
}
