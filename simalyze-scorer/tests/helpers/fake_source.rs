//! In-memory `MetadataSource` with call counters
//!
//! Every resource is configurable; a resource left as `None` answers with an
//! HTTP 500. Counters and an in-flight high-water mark let tests check
//! caching and concurrency without a server.

use async_trait::async_trait;
use serde_json::json;
use simalyze_scorer::error::FetchError;
use simalyze_scorer::types::{
    CanonicalIdentity, CreatorStats, ItemRecord, ProjectInfo, ProjectStats, RevisionInfo,
};
use simalyze_scorer::MetadataSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mutable answers of the fake
#[derive(Debug, Clone, Default)]
pub struct FakeData {
    pub records_by_slug: HashMap<(String, String), ItemRecord>,
    pub records_by_id: HashMap<String, ItemRecord>,
    pub creators: HashMap<String, CreatorStats>,
    pub assets: Option<u64>,
    pub revisions: Option<u64>,
    pub screenshots: Option<u64>,
    pub engagement: Option<f64>,
    pub descendants: Option<u64>,
    pub content: Option<String>,
}

impl FakeData {
    /// Every item-scoped resource answers
    pub fn with_all_resources(mut self) -> Self {
        self.assets = Some(5);
        self.revisions = Some(8);
        self.screenshots = Some(2);
        self.engagement = Some(30.0);
        self.descendants = Some(3);
        self.content = Some("<html><body>orbit</body></html>".to_string());
        self
    }

    /// Reachable by slug and by id
    pub fn with_record(mut self, owner: &str, item: &str, record: ItemRecord) -> Self {
        self.records_by_id
            .insert(record.project.id.clone(), record.clone());
        self.records_by_slug
            .insert((owner.to_string(), item.to_string()), record);
        self
    }

    /// Reachable by id only
    pub fn with_record_by_id(mut self, record: ItemRecord) -> Self {
        self.records_by_id
            .insert(record.project.id.clone(), record);
        self
    }

    pub fn with_creator(mut self, name: &str, likes: u64, views: u64) -> Self {
        self.creators.insert(
            name.to_string(),
            CreatorStats {
                total_likes: likes,
                total_views: views,
            },
        );
        self
    }
}

pub struct FakeSource {
    data: Mutex<FakeData>,
    delay: Duration,
    calls: Mutex<HashMap<&'static str, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new(data: FakeData) -> Self {
        Self::with_delay(data, Duration::ZERO)
    }

    /// Every call sleeps for `delay` before answering
    pub fn with_delay(data: FakeData, delay: Duration) -> Self {
        Self {
            data: Mutex::new(data),
            delay,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Change answers mid-test
    pub fn update(&self, change: impl FnOnce(&mut FakeData)) {
        change(&mut self.data.lock().unwrap());
    }

    pub fn calls(&self, method: &'static str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of calls seen running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer<T>(
        &self,
        method: &'static str,
        pick: impl FnOnce(&FakeData) -> Option<T>,
    ) -> Result<T, FetchError> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let answer = pick(&self.data.lock().unwrap());
        answer.ok_or_else(|| FetchError::Status {
            status: 500,
            url: format!("fake://{}", method),
        })
    }
}

#[async_trait]
impl MetadataSource for FakeSource {
    async fn record_by_slug(&self, owner: &str, item: &str) -> Result<ItemRecord, FetchError> {
        let key = (owner.to_string(), item.to_string());
        self.answer("record_by_slug", |d| d.records_by_slug.get(&key).cloned())
            .await
    }

    async fn record_by_id(&self, id: &str) -> Result<ItemRecord, FetchError> {
        self.answer("record_by_id", |d| d.records_by_id.get(id).cloned())
            .await
    }

    async fn creator_stats(&self, creator: &str) -> Result<CreatorStats, FetchError> {
        self.answer("creator_stats", |d| d.creators.get(creator).copied())
            .await
    }

    async fn asset_count(&self, _id: &CanonicalIdentity, _version: u64) -> Result<u64, FetchError> {
        self.answer("asset_count", |d| d.assets).await
    }

    async fn revision_count(&self, _id: &CanonicalIdentity) -> Result<u64, FetchError> {
        self.answer("revision_count", |d| d.revisions).await
    }

    async fn screenshot_count(
        &self,
        _id: &CanonicalIdentity,
        _version: u64,
    ) -> Result<u64, FetchError> {
        self.answer("screenshot_count", |d| d.screenshots).await
    }

    async fn avg_engagement_secs(&self, _id: &CanonicalIdentity) -> Result<f64, FetchError> {
        self.answer("avg_engagement_secs", |d| d.engagement).await
    }

    async fn descendant_count(&self, _id: &CanonicalIdentity) -> Result<u64, FetchError> {
        self.answer("descendant_count", |d| d.descendants).await
    }

    async fn content_body(
        &self,
        _id: &CanonicalIdentity,
        _version: u64,
    ) -> Result<String, FetchError> {
        self.answer("content_body", |d| d.content.clone()).await
    }
}

/// A healthy published item record
pub fn sample_record(id: &str, version: u64) -> ItemRecord {
    ItemRecord {
        project: ProjectInfo {
            id: id.to_string(),
            title: Some("Orbit Sandbox Deluxe".to_string()),
            description: Some("A small gravity toy with orbiting planets".to_string()),
            stats: Some(ProjectStats {
                likes: 150,
                views: 3_000,
            }),
            from_template: false,
            created_by: None,
        },
        project_revision: Some(RevisionInfo { version }),
        site: Some(json!({ "id": "site_1" })),
    }
}
