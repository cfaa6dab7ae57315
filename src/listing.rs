use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::config::SourceConfig;
use crate::error::PipelineError;
use crate::formats::{FileRecord, ListPage};

pub const MAX_RECORDS: usize = 10_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard caps on one listing run, independent of what upstream reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    pub max_pages: usize,
    pub max_records: usize,
}

impl ListingLimits {
    pub const GALLERY: Self = Self {
        max_pages: 200,
        max_records: MAX_RECORDS,
    };

    pub const DIRECTORIES: Self = Self {
        max_pages: 120,
        max_records: MAX_RECORDS,
    };
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub records: Vec<FileRecord>,
    pub pages: usize,
}

/// Where listing records come from. [`ListingClient`] talks to ImgBed.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn list_all(
        &self,
        config: &SourceConfig,
        limits: ListingLimits,
    ) -> Result<Listing, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
}

impl ListingClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build listing http client")?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch_page(
        &self,
        url: Url,
        token: &str,
        page: usize,
    ) -> Result<ListPage, PipelineError> {
        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, "imgbed-gallery/0.1");
        if let Some(auth) = authorization_header(token) {
            request = request.header(AUTHORIZATION, auth);
        }

        let transport = |source| PipelineError::Transport {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream_status(status, &body));
        }

        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| PipelineError::Decode { page, source })
    }
}

#[async_trait]
impl ListingSource for ListingClient {
    async fn list_all(
        &self,
        config: &SourceConfig,
        limits: ListingLimits,
    ) -> Result<Listing, PipelineError> {
        let endpoint = config.list_endpoint_url();
        let endpoint = Url::parse(&endpoint)
            .map_err(|source| PipelineError::InvalidEndpoint { endpoint, source })?;

        let mut records: Vec<FileRecord> = Vec::new();
        let mut start = 0_usize;
        let mut page = 0_usize;

        while records.len() < limits.max_records && page < limits.max_pages {
            page += 1;
            let url = page_url(&endpoint, config, start);
            let payload = self.fetch_page(url, &config.api_token, page).await?;

            let received = payload.files.len();
            let returned = payload.returned_count().unwrap_or(received);
            let total = payload.total_count();
            records.extend(payload.files);
            tracing::debug!(
                page,
                start,
                received,
                returned,
                ?total,
                accumulated = records.len(),
                "listing page"
            );

            if received == 0 || returned < config.page_size {
                break;
            }
            start = start.saturating_add(returned);
            if total.is_some_and(|total| records.len() >= total) {
                break;
            }
        }

        if page >= limits.max_pages || records.len() >= limits.max_records {
            tracing::warn!(
                pages = page,
                records = records.len(),
                ?limits,
                "listing stopped at a hard cap"
            );
        }
        records.truncate(limits.max_records);
        tracing::info!(pages = page, records = records.len(), "listing complete");

        Ok(Listing {
            records,
            pages: page,
        })
    }
}

fn page_url(endpoint: &Url, config: &SourceConfig, start: usize) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("start", &start.to_string())
            .append_pair("count", &config.page_size.to_string())
            .append_pair("fileType", "image")
            .append_pair("accessStatus", "normal");
        if config.recursive {
            query.append_pair("recursive", "true");
        }
        if !config.list_dir.is_empty() {
            query.append_pair("dir", &config.list_dir);
        }
    }
    url
}

/// `Bearer <token>` unless the caller already included the scheme.
pub fn authorization_header(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let has_scheme = token
        .get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("bearer "));
    if has_scheme {
        Some(token.to_owned())
    } else {
        Some(format!("Bearer {token}"))
    }
}
