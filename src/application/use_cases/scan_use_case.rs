// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    application::dto::{
        audit_request::ListQueryDto,
        report_response::{PageIssuesResponse, ScanDetailResponse, ScanPagesResponse},
        scan_request::CreateScanRequestDto,
    },
    config::settings::ScanSettings,
    domain::{
        models::{
            job::Job,
            scan::{url_hash, CrawlConfig, ScanPage, ScanSummary, SiteAuditScan},
            score::ThematicReport,
        },
        repositories::{job_repository::RepositoryError, scan_repository::ScanRepository},
        services::{
            issue_classifier,
            thematic_scorer::{PageSignals, ThematicScorer},
        },
    },
    queue::job_queue::{JobQueue, QueueError},
    utils::validators::{normalize_domain, validate_start_url},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ScanUseCaseError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Scan not found")]
    NotFound,
    #[error("Scan page not found")]
    PageNotFound,
    #[error("Scan belongs to another user")]
    Forbidden,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

pub struct ScanUseCase<SR, Q> {
    scan_repo: Arc<SR>,
    queue: Arc<Q>,
    settings: ScanSettings,
    scorer: ThematicScorer,
}

impl<SR, Q> ScanUseCase<SR, Q>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    pub fn new(scan_repo: Arc<SR>, queue: Arc<Q>, settings: ScanSettings, scorer: ThematicScorer) -> Self {
        Self {
            scan_repo,
            queue,
            settings,
            scorer,
        }
    }

    pub async fn create_scan(
        &self,
        user_id: Uuid,
        dto: CreateScanRequestDto,
    ) -> Result<SiteAuditScan, ScanUseCaseError> {
        dto.validate()
            .map_err(|e| ScanUseCaseError::Validation(e.to_string()))?;

        let domain = normalize_domain(&dto.domain)
            .map_err(|e| ScanUseCaseError::Validation(e.to_string()))?;
        let start_url = dto
            .start_url
            .as_deref()
            .map(|url| validate_start_url(url, &domain))
            .transpose()
            .map_err(|e| ScanUseCaseError::Validation(e.to_string()))?;

        let config = CrawlConfig {
            max_pages: dto.max_pages.unwrap_or(self.settings.default_max_pages),
            enable_javascript: dto.enable_javascript,
            store_raw_html: dto.store_raw_html,
            calculate_keyword_density: dto.calculate_keyword_density,
            start_url,
        };

        let mut scan = SiteAuditScan::new(user_id, domain, config);
        scan.audit_id = dto.audit_id;
        scan.domain_entity_id = dto.domain_entity_id;

        let scan = self.scan_repo.create(&scan).await?;
        if let Err(e) = self.queue.enqueue(Job::site_scan(scan.id)).await {
            if let Err(cleanup) = self.scan_repo.delete(scan.id).await {
                error!("Failed to remove scan {} after enqueue error: {}", scan.id, cleanup);
            }
            return Err(e.into());
        }

        info!("Site scan {} created for {}", scan.id, scan.domain);
        Ok(scan)
    }

    async fn owned_scan(&self, user_id: Uuid, id: Uuid) -> Result<SiteAuditScan, ScanUseCaseError> {
        let scan = self
            .scan_repo
            .find_by_id(id)
            .await?
            .ok_or(ScanUseCaseError::NotFound)?;
        if scan.user_id != user_id {
            return Err(ScanUseCaseError::Forbidden);
        }
        Ok(scan)
    }

    /// 扫描详情：状态、摘要以及代表页面的主题评分
    pub async fn get_scan(&self, user_id: Uuid, id: Uuid) -> Result<ScanDetailResponse, ScanUseCaseError> {
        let scan = self.owned_scan(user_id, id).await?;
        let summary = self.scan_repo.find_summary(id).await?;
        let pages_count = self.scan_repo.count_pages(id).await?;

        let report = match &summary {
            Some(summary) => self.representative_report(&scan, summary).await?,
            None => None,
        };

        Ok(ScanDetailResponse {
            scan,
            summary,
            report,
            pages_count,
        })
    }

    /// 代表页面为起始URL对应的页面，找不到时取URL排序的第一页
    async fn representative_report(
        &self,
        scan: &SiteAuditScan,
        summary: &ScanSummary,
    ) -> Result<Option<ThematicReport>, ScanUseCaseError> {
        let page: Option<ScanPage> = match self
            .scan_repo
            .find_page_by_hash(scan.id, &url_hash(&scan.start_url()))
            .await?
        {
            Some(page) => Some(page),
            None => self.scan_repo.list_pages(scan.id, 1, 0).await?.into_iter().next(),
        };

        Ok(page.map(|page| {
            let signals = PageSignals::from_scan_page(&page).with_summary(summary);
            self.scorer.score(&signals)
        }))
    }

    pub async fn list_scans(
        &self,
        user_id: Uuid,
        query: &ListQueryDto,
    ) -> Result<Vec<SiteAuditScan>, ScanUseCaseError> {
        query
            .validate()
            .map_err(|e| ScanUseCaseError::Validation(e.to_string()))?;
        Ok(self
            .scan_repo
            .list_by_user(user_id, query.limit(), query.offset())
            .await?)
    }

    pub async fn list_pages(
        &self,
        user_id: Uuid,
        id: Uuid,
        query: &ListQueryDto,
    ) -> Result<ScanPagesResponse, ScanUseCaseError> {
        query
            .validate()
            .map_err(|e| ScanUseCaseError::Validation(e.to_string()))?;
        self.owned_scan(user_id, id).await?;

        let total = self.scan_repo.count_pages(id).await?;
        let pages = self
            .scan_repo
            .list_pages(id, query.limit(), query.offset())
            .await?;
        Ok(ScanPagesResponse {
            scan_id: id,
            total,
            limit: query.limit(),
            offset: query.offset(),
            pages,
        })
    }

    /// 按严重程度对单页检查项分类
    pub async fn page_issues(
        &self,
        user_id: Uuid,
        scan_id: Uuid,
        page_id: Uuid,
    ) -> Result<PageIssuesResponse, ScanUseCaseError> {
        self.owned_scan(user_id, scan_id).await?;
        let page = self
            .scan_repo
            .find_page(scan_id, page_id)
            .await?
            .ok_or(ScanUseCaseError::PageNotFound)?;

        let buckets = issue_classifier::classify(&page.boolean_checks());
        Ok(PageIssuesResponse {
            page_id: page.id,
            url: page.url,
            issue_types: page.issue_types,
            buckets,
        })
    }

    pub async fn delete_scan(&self, user_id: Uuid, id: Uuid) -> Result<(), ScanUseCaseError> {
        self.owned_scan(user_id, id).await?;
        self.scan_repo.delete(id).await?;
        info!("Site scan {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::scan::{CrawledPage, ScanStatus};
    use crate::domain::services::thematic_scorer::ScoringConfig;
    use crate::mocks::{accepting_queue, MockJobQueue, MockScanRepository};
    use serde_json::json;

    fn settings() -> ScanSettings {
        ScanSettings {
            page_batch_size: 100,
            poll_interval_seconds: 30,
            max_poll_attempts: 10,
            default_max_pages: 250,
        }
    }

    fn use_case(repo: MockScanRepository, queue: MockJobQueue) -> ScanUseCase<MockScanRepository, MockJobQueue> {
        ScanUseCase::new(
            Arc::new(repo),
            Arc::new(queue),
            settings(),
            ThematicScorer::new(ScoringConfig::default()),
        )
    }

    fn request(domain: &str, start_url: Option<&str>) -> CreateScanRequestDto {
        CreateScanRequestDto {
            domain: domain.to_string(),
            max_pages: None,
            enable_javascript: false,
            store_raw_html: false,
            calculate_keyword_density: true,
            start_url: start_url.map(str::to_string),
            audit_id: None,
            domain_entity_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_scan_removes_record_when_enqueue_fails() {
        let mut repo = MockScanRepository::new();
        repo.expect_create().times(1).returning(|scan| Ok(scan.clone()));
        repo.expect_delete().times(1).returning(|_| Ok(()));

        let mut queue = MockJobQueue::new();
        queue.expect_enqueue().times(1).returning(|_| {
            Err(QueueError::Repository(RepositoryError::Corrupted("jobs table unavailable".into())))
        });

        let err = use_case(repo, queue)
            .create_scan(Uuid::new_v4(), request("example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanUseCaseError::Queue(_)));
    }

    #[tokio::test]
    async fn test_create_scan_applies_default_max_pages() {
        let mut repo = MockScanRepository::new();
        repo.expect_create().times(1).returning(|s| Ok(s.clone()));

        let scan = use_case(repo, accepting_queue())
            .create_scan(Uuid::new_v4(), request("Example.com", None))
            .await
            .unwrap();
        assert_eq!(scan.status, ScanStatus::Pending);
        assert_eq!(scan.domain, "example.com");
        assert_eq!(scan.config.max_pages, 250);
        assert!(scan.config.calculate_keyword_density);
    }

    #[tokio::test]
    async fn test_start_url_outside_domain_is_rejected() {
        let mut repo = MockScanRepository::new();
        repo.expect_create().never();

        let err = use_case(repo, MockJobQueue::new())
            .create_scan(Uuid::new_v4(), request("example.com", Some("https://other.com/")))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanUseCaseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_scan_without_summary_has_no_report() {
        let user_id = Uuid::new_v4();
        let scan = SiteAuditScan::new(user_id, "example.com".to_string(), CrawlConfig::default());
        let id = scan.id;

        let mut repo = MockScanRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(scan.clone())));
        repo.expect_find_summary().returning(|_| Ok(None));
        repo.expect_count_pages().returning(|_| Ok(0));
        repo.expect_find_page_by_hash().never();

        let detail = use_case(repo, accepting_queue()).get_scan(user_id, id).await.unwrap();
        assert!(detail.summary.is_none());
        assert!(detail.report.is_none());
    }

    #[tokio::test]
    async fn test_get_scan_scores_start_page() {
        let user_id = Uuid::new_v4();
        let scan = SiteAuditScan::new(user_id, "example.com".to_string(), CrawlConfig::default());
        let id = scan.id;
        let home = ScanPage::from_crawled(
            id,
            CrawledPage {
                url: "https://example.com/".to_string(),
                checks: serde_json::from_value(json!({ "is_https": true, "is_http": false }))
                    .unwrap(),
                ..Default::default()
            },
        );
        let expected_hash = home.url_hash.clone();

        let mut repo = MockScanRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(scan.clone())));
        repo.expect_find_summary().returning(move |scan_id| {
            Ok(Some(ScanSummary {
                scan_id,
                ssl_info: json!({ "valid_certificate": true }),
                ..Default::default()
            }))
        });
        repo.expect_count_pages().returning(|_| Ok(1));
        repo.expect_find_page_by_hash()
            .withf(move |_, hash| hash == expected_hash)
            .returning(move |_, _| Ok(Some(home.clone())));
        repo.expect_list_pages().never();

        let detail = use_case(repo, accepting_queue()).get_scan(user_id, id).await.unwrap();
        let report = detail.report.expect("report for scanned page");
        assert_eq!(report.categories.len(), 6);
        assert_eq!(detail.pages_count, 1);
    }

    #[tokio::test]
    async fn test_page_issues_classifies_checks() {
        let user_id = Uuid::new_v4();
        let scan = SiteAuditScan::new(user_id, "example.com".to_string(), CrawlConfig::default());
        let scan_id = scan.id;
        let page = ScanPage::from_crawled(
            scan_id,
            CrawledPage {
                url: "https://example.com/broken".to_string(),
                checks: serde_json::from_value(json!({
                    "is_broken": true,
                    "no_title": false,
                    "made_up_check": true
                }))
                .unwrap(),
                ..Default::default()
            },
        );
        let page_id = page.id;

        let mut repo = MockScanRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(scan.clone())));
        repo.expect_find_page()
            .with(mockall::predicate::eq(scan_id), mockall::predicate::eq(page_id))
            .returning(move |_, _| Ok(Some(page.clone())));

        let issues = use_case(repo, accepting_queue())
            .page_issues(user_id, scan_id, page_id)
            .await
            .unwrap();
        assert_eq!(issues.buckets.error_ids(), vec!["is_broken".to_string()]);
        assert_eq!(issues.buckets.passed.len(), 1);
        assert_eq!(issues.buckets.total(), 2);
    }
}
