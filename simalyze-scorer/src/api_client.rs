//! Remote metadata API client
//!
//! Read-only access to the nine endpoints the resolver needs. All are GET;
//! eight return JSON and one returns the raw content body as text.
//!
//! # API Reference
//! - Base URL: https://api.websim.com/api/v1 (configurable)
//! - `GET /users/{owner}/slugs/{item}` - core record by slug pair
//! - `GET /projects/{id}` - core record by identifier
//! - `GET /users/{creator}/stats` - creator aggregate stats
//! - `GET /projects/{id}/revisions/{version}/assets` - asset list
//! - `GET /projects/{id}/revisions` - revision list
//! - `GET /projects/{id}/revisions/{version}/screenshots` - screenshot list
//! - `GET /projects/{id}/stats` - engagement stats
//! - `GET /projects/{id}/descendants?first=0` - remix list
//! - `GET /projects/{id}/revisions/{version}/html` - raw content body

use crate::error::{AnalyzerError, FetchError};
use crate::types::{
    CanonicalIdentity, CreatorStats, ItemRecord, ProjectInfo, RevisionInfo,
};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.websim.com/api/v1";

/// Default timeout for API requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("simalyze/", env!("CARGO_PKG_VERSION"));

/// The remote endpoints the resolver depends on
///
/// [`ApiClient`] is the HTTP implementation; tests substitute in-memory
/// sources.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Core record by `(owner, item)` slug pair
    async fn record_by_slug(&self, owner: &str, item: &str) -> Result<ItemRecord, FetchError>;

    /// Core record by identifier
    async fn record_by_id(&self, id: &str) -> Result<ItemRecord, FetchError>;

    /// Aggregate stats for a creator
    async fn creator_stats(&self, creator: &str) -> Result<CreatorStats, FetchError>;

    /// Number of assets in one revision
    async fn asset_count(&self, id: &CanonicalIdentity, version: u64) -> Result<u64, FetchError>;

    /// Number of revisions of an item
    async fn revision_count(&self, id: &CanonicalIdentity) -> Result<u64, FetchError>;

    /// Number of screenshots attached to one revision
    async fn screenshot_count(
        &self,
        id: &CanonicalIdentity,
        version: u64,
    ) -> Result<u64, FetchError>;

    /// Average active engagement duration, in seconds
    async fn avg_engagement_secs(&self, id: &CanonicalIdentity) -> Result<f64, FetchError>;

    /// Number of remixes derived from an item
    async fn descendant_count(&self, id: &CanonicalIdentity) -> Result<u64, FetchError>;

    /// Raw content body of one revision
    async fn content_body(&self, id: &CanonicalIdentity, version: u64)
        -> Result<String, FetchError>;
}

/// HTTP client for the metadata API
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalyzerError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AnalyzerError::HttpClient(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AnalyzerError::HttpClient(format!(
                "Base URL cannot carry a path: {}",
                base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AnalyzerError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        debug!(url = %url, "API request");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self.get(url.clone()).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("Reading body of {} failed: {}", url, e)))?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Parse(format!("Unexpected response from {}: {}", url, e)))
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        let response = self.get(url.clone()).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Reading body of {} failed: {}", url, e)))
    }
}

#[async_trait]
impl MetadataSource for ApiClient {
    async fn record_by_slug(&self, owner: &str, item: &str) -> Result<ItemRecord, FetchError> {
        let url = self.endpoint(&["users", owner, "slugs", item]);
        self.get_json::<RecordResponse>(url).await?.into_record()
    }

    async fn record_by_id(&self, id: &str) -> Result<ItemRecord, FetchError> {
        let url = self.endpoint(&["projects", id]);
        self.get_json::<RecordResponse>(url).await?.into_record()
    }

    async fn creator_stats(&self, creator: &str) -> Result<CreatorStats, FetchError> {
        let url = self.endpoint(&["users", creator, "stats"]);
        self.get_json::<CreatorStatsResponse>(url)
            .await?
            .stats
            .ok_or(FetchError::MissingField("stats"))
    }

    async fn asset_count(&self, id: &CanonicalIdentity, version: u64) -> Result<u64, FetchError> {
        let version = version.to_string();
        let url = self.endpoint(&["projects", id.as_str(), "revisions", &version, "assets"]);
        let response: AssetsResponse = self.get_json(url).await?;
        Ok(list_len(&response.assets))
    }

    async fn revision_count(&self, id: &CanonicalIdentity) -> Result<u64, FetchError> {
        let url = self.endpoint(&["projects", id.as_str(), "revisions"]);
        let response: RevisionsResponse = self.get_json(url).await?;
        Ok(response
            .revisions
            .map(|page| list_len(&page.data))
            .unwrap_or(0))
    }

    async fn screenshot_count(
        &self,
        id: &CanonicalIdentity,
        version: u64,
    ) -> Result<u64, FetchError> {
        let version = version.to_string();
        let url = self.endpoint(&["projects", id.as_str(), "revisions", &version, "screenshots"]);
        let response: ScreenshotsResponse = self.get_json(url).await?;
        Ok(list_len(&response.screenshots))
    }

    async fn avg_engagement_secs(&self, id: &CanonicalIdentity) -> Result<f64, FetchError> {
        let url = self.endpoint(&["projects", id.as_str(), "stats"]);
        let response: ProjectStatsResponse = self.get_json(url).await?;
        Ok(response
            .playtime_stats
            .unwrap_or_default()
            .first()
            .and_then(|stat| stat.avg_active_dur)
            .unwrap_or(0.0))
    }

    async fn descendant_count(&self, id: &CanonicalIdentity) -> Result<u64, FetchError> {
        let mut url = self.endpoint(&["projects", id.as_str(), "descendants"]);
        url.query_pairs_mut().append_pair("first", "0");
        let response: DescendantsResponse = self.get_json(url).await?;

        let Some(page) = response.projects else {
            return Ok(0);
        };
        // Prefer the server-side total; fall back to the page length
        let total = page.meta.and_then(|meta| meta.count).filter(|count| *count > 0);
        Ok(total.unwrap_or_else(|| list_len(&page.data)))
    }

    async fn content_body(
        &self,
        id: &CanonicalIdentity,
        version: u64,
    ) -> Result<String, FetchError> {
        let version = version.to_string();
        let url = self.endpoint(&["projects", id.as_str(), "revisions", &version, "html"]);
        self.get_text(url).await
    }
}

fn list_len(list: &Option<Vec<IgnoredAny>>) -> u64 {
    list.as_ref().map_or(0, |items| items.len() as u64)
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct RecordResponse {
    #[serde(default)]
    project: Option<ProjectInfo>,
    #[serde(default)]
    project_revision: Option<RevisionInfo>,
    #[serde(default)]
    site: Option<serde_json::Value>,
}

impl RecordResponse {
    /// Only a response carrying `project.id` identifies anything
    fn into_record(self) -> Result<ItemRecord, FetchError> {
        let project = self
            .project
            .filter(|project| !project.id.is_empty())
            .ok_or(FetchError::MissingField("project.id"))?;

        Ok(ItemRecord {
            project,
            project_revision: self.project_revision,
            site: self.site,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatorStatsResponse {
    #[serde(default)]
    stats: Option<CreatorStats>,
}

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    #[serde(default)]
    assets: Option<Vec<IgnoredAny>>,
}

#[derive(Debug, Deserialize)]
struct RevisionsResponse {
    #[serde(default)]
    revisions: Option<ListPage>,
}

#[derive(Debug, Deserialize)]
struct ScreenshotsResponse {
    #[serde(default)]
    screenshots: Option<Vec<IgnoredAny>>,
}

#[derive(Debug, Deserialize)]
struct ProjectStatsResponse {
    #[serde(default)]
    playtime_stats: Option<Vec<PlaytimeStat>>,
}

#[derive(Debug, Deserialize)]
struct PlaytimeStat {
    #[serde(default)]
    avg_active_dur: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DescendantsResponse {
    #[serde(default)]
    projects: Option<ListPage>,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    meta: Option<ListMeta>,
    #[serde(default)]
    data: Option<Vec<IgnoredAny>>,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    #[serde(default)]
    count: Option<u64>,
}

// ============================================================================
// Tests
// ============================================================================
