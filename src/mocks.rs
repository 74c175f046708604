// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试共用的 mockall 替身

use crate::domain::models::audit::{Audit, BacklinksSummary, BusinessProfile, KeywordPosition};
use crate::domain::models::geo_grid::{CompetitorSample, GeoGridScan, GridPoint};
use crate::domain::models::job::Job;
use crate::domain::models::scan::{CrawlConfig, CrawledPage, ScanPage, ScanSummary, SiteAuditScan};
use crate::domain::providers::{
    CrawlProvider, CrawlSummaryRecord, CrawlTaskStatus, PageBatch, PlacesProvider, ProviderError,
    RankProvider, RankQuery,
};
use crate::domain::repositories::audit_repository::AuditRepository;
use crate::domain::repositories::geo_grid_repository::GeoGridRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::scan_repository::ScanRepository;
use crate::queue::job_queue::{JobQueue, QueueError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use std::time::Duration;
use uuid::Uuid;

mock! {
    pub AuditRepository {}
    #[async_trait]
    impl AuditRepository for AuditRepository {
        async fn create(&self, audit: &Audit) -> Result<Audit, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Audit>, RepositoryError>;
        async fn update(&self, audit: &Audit) -> Result<Audit, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
        async fn list_by_user(&self, user_id: Uuid, limit: u64, offset: u64) -> Result<Vec<Audit>, RepositoryError>;
        async fn find_recent_for_domain(&self, user_id: Uuid, domain: &str, since: DateTime<Utc>) -> Result<Option<Audit>, RepositoryError>;
        async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<Audit>, RepositoryError>;
    }
}

mock! {
    pub ScanRepository {}
    #[async_trait]
    impl ScanRepository for ScanRepository {
        async fn create(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<SiteAuditScan>, RepositoryError>;
        async fn update(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
        async fn list_by_user(&self, user_id: Uuid, limit: u64, offset: u64) -> Result<Vec<SiteAuditScan>, RepositoryError>;
        async fn upsert_pages(&self, scan_id: Uuid, pages: &[ScanPage]) -> Result<u64, RepositoryError>;
        async fn count_pages(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;
        async fn list_pages(&self, scan_id: Uuid, limit: u64, offset: u64) -> Result<Vec<ScanPage>, RepositoryError>;
        async fn find_page(&self, scan_id: Uuid, page_id: Uuid) -> Result<Option<ScanPage>, RepositoryError>;
        async fn find_page_by_hash(&self, scan_id: Uuid, url_hash: &str) -> Result<Option<ScanPage>, RepositoryError>;
        async fn save_summary(&self, summary: &ScanSummary) -> Result<(), RepositoryError>;
        async fn find_summary(&self, scan_id: Uuid) -> Result<Option<ScanSummary>, RepositoryError>;
        async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<SiteAuditScan>, RepositoryError>;
    }
}

mock! {
    pub GeoGridRepository {}
    #[async_trait]
    impl GeoGridRepository for GeoGridRepository {
        async fn create(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<GeoGridScan>, RepositoryError>;
        async fn update(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
        async fn upsert_point(&self, point: &GridPoint) -> Result<bool, RepositoryError>;
        async fn list_points(&self, scan_id: Uuid) -> Result<Vec<GridPoint>, RepositoryError>;
        async fn latest_completed(&self, user_id: Uuid, campaign_id: Uuid, limit: u64) -> Result<Vec<GeoGridScan>, RepositoryError>;
        async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<GeoGridScan>, RepositoryError>;
    }
}

mock! {
    pub JobQueue {}
    #[async_trait]
    impl JobQueue for JobQueue {
        async fn enqueue(&self, job: Job) -> Result<Job, QueueError>;
        async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError>;
        async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;
        async fn fail(&self, job_id: Uuid) -> Result<(), QueueError>;
        async fn reschedule(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError>;
        async fn reset_stuck_jobs(&self) -> Result<u64, QueueError>;
    }
}

mock! {
    pub CrawlProvider {}
    #[async_trait]
    impl CrawlProvider for CrawlProvider {
        async fn submit_crawl(&self, target: &str, config: &CrawlConfig) -> Result<String, ProviderError>;
        async fn crawl_status(&self, task_id: &str) -> Result<CrawlTaskStatus, ProviderError>;
        async fn fetch_pages(&self, task_id: &str, offset: u32, limit: u32) -> Result<PageBatch, ProviderError>;
        async fn fetch_summary(&self, task_id: &str) -> Result<CrawlSummaryRecord, ProviderError>;
        async fn instant_page(&self, url: &str, use_cache: bool) -> Result<CrawledPage, ProviderError>;
    }
}

mock! {
    pub RankProvider {}
    #[async_trait]
    impl RankProvider for RankProvider {
        async fn keyword_rankings(&self, query: &RankQuery) -> Result<Vec<KeywordPosition>, ProviderError>;
        async fn backlinks_summary(&self, domain: &str, use_cache: bool) -> Result<BacklinksSummary, ProviderError>;
        async fn competitor_domains(&self, domain: &str, location: Option<String>, limit: u32) -> Result<Vec<String>, ProviderError>;
    }
}

mock! {
    pub PlacesProvider {}
    #[async_trait]
    impl PlacesProvider for PlacesProvider {
        async fn find_business(&self, name: &str, location: Option<String>) -> Result<Option<BusinessProfile>, ProviderError>;
        async fn local_rankings(&self, keyword: &str, lat: f64, lng: f64) -> Result<Vec<CompetitorSample>, ProviderError>;
    }
}

/// 一个把任务原样返回的队列替身
pub fn accepting_queue() -> MockJobQueue {
    let mut queue = MockJobQueue::new();
    queue.expect_enqueue().returning(Ok);
    queue
}
