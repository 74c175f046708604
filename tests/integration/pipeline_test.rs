// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{audit_settings, geo_grid_settings, scan_settings, setup_db};
use auditrs::application::dto::audit_request::CreateAuditRequestDto;
use auditrs::application::dto::geo_grid_request::CreateGeoGridRequestDto;
use auditrs::application::dto::scan_request::CreateScanRequestDto;
use auditrs::application::use_cases::audit_use_case::AuditUseCase;
use auditrs::application::use_cases::geo_grid_use_case::GeoGridUseCase;
use auditrs::application::use_cases::scan_use_case::ScanUseCase;
use auditrs::config::settings::ProviderSettings;
use auditrs::domain::models::audit::AuditStatus;
use auditrs::domain::models::geo_grid::GeoGridStatus;
use auditrs::domain::models::scan::ScanStatus;
use auditrs::domain::repositories::audit_repository::AuditRepository;
use auditrs::domain::repositories::geo_grid_repository::GeoGridRepository;
use auditrs::domain::repositories::scan_repository::ScanRepository;
use auditrs::domain::services::thematic_scorer::ThematicScorer;
use auditrs::engines::http_provider::HttpProviderClient;
use auditrs::infrastructure::repositories::audit_repo_impl::AuditRepositoryImpl;
use auditrs::infrastructure::repositories::geo_grid_repo_impl::GeoGridRepositoryImpl;
use auditrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use auditrs::presentation::routes::AppJobQueue;
use auditrs::workers::audit_executor::AuditExecutor;
use auditrs::workers::geo_grid_executor::GeoGridExecutor;
use auditrs::workers::job_worker::{JobHandlers, JobWorker};
use auditrs::workers::scan_executor::ScanExecutor;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Pipeline {
    audit_repo: Arc<AuditRepositoryImpl>,
    scan_repo: Arc<ScanRepositoryImpl>,
    grid_repo: Arc<GeoGridRepositoryImpl>,
    queue: Arc<AppJobQueue>,
    worker: JobWorker<AppJobQueue>,
}

impl Pipeline {
    async fn new(provider: &MockServer) -> Self {
        let db = setup_db().await;
        let audit_repo = Arc::new(AuditRepositoryImpl::new(db.clone()));
        let scan_repo = Arc::new(ScanRepositoryImpl::new(db.clone()));
        let grid_repo = Arc::new(GeoGridRepositoryImpl::new(db.clone()));
        let queue = Arc::new(AppJobQueue::new(
            Arc::new(JobRepositoryImpl::new(db)),
            chrono::Duration::minutes(10),
        ));

        let client = Arc::new(
            HttpProviderClient::new(&ProviderSettings {
                base_url: provider.uri(),
                login: None,
                password: None,
                timeout_seconds: 5,
                max_retries: 0,
            })
            .unwrap(),
        );

        let handlers = JobHandlers {
            audit: Arc::new(AuditExecutor::new(
                audit_repo.clone(),
                client.clone(),
                client.clone(),
                client.clone(),
                ThematicScorer::default(),
                audit_settings(),
            )),
            scan: Arc::new(ScanExecutor::new(
                scan_repo.clone(),
                client.clone(),
                queue.clone(),
                scan_settings(),
            )),
            geo_grid: Arc::new(GeoGridExecutor::new(grid_repo.clone(), client)),
        };
        let worker = JobWorker::new(queue.clone(), handlers, Duration::from_millis(10));

        Self {
            audit_repo,
            scan_repo,
            grid_repo,
            queue,
            worker,
        }
    }

    /// 处理队列直到没有到期任务
    async fn drain(&self) -> usize {
        let mut processed = 0;
        while self.worker.process_next().await.unwrap() {
            processed += 1;
            assert!(processed < 50, "queue did not drain");
        }
        processed
    }
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

#[tokio::test]
async fn test_audit_runs_to_completion() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/onpage/instant"))
        .respond_with(envelope(json!({
            "url": "https://example-dental.com/",
            "status_code": 200,
            "checks": { "is_https": true, "no_title": true, "is_broken": false }
        })))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/serp/rankings"))
        .respond_with(envelope(json!({
            "keywords": [{ "keyword": "dentist austin", "position": 4, "search_volume": 880 }]
        })))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/backlinks/summary"))
        .respond_with(envelope(json!({
            "backlinks": 150,
            "referring_domains": 22,
            "domain_rank": 31,
            "referring_domain_list": ["news.example"]
        })))
        .mount(&provider)
        .await;

    let pipeline = Pipeline::new(&provider).await;
    let use_case = AuditUseCase::new(pipeline.audit_repo.clone(), pipeline.queue.clone(), audit_settings());
    let user = Uuid::new_v4();
    let audit = use_case
        .create_audit(
            user,
            CreateAuditRequestDto {
                domain: "example-dental.com".to_string(),
                keywords: vec!["Dentist Austin".to_string()],
                competitors: vec!["rival.com".to_string()],
                city: Some("Austin".to_string()),
                state: Some("TX".to_string()),
                business_name: None,
                business_location: None,
                place_id: None,
                skip_cache: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(pipeline.drain().await, 1);

    let done = pipeline.audit_repo.find_by_id(audit.id).await.unwrap().unwrap();
    assert_eq!(done.status, AuditStatus::Completed);
    assert_eq!(done.progress, 100);
    assert_eq!(done.score, Some(done.step_results.onpage().unwrap().report.overall_score));

    let report = use_case.competitor_report(user, audit.id).await.unwrap();
    assert_eq!(report.domain, "example-dental.com");
    assert!(!report.comparison.is_empty());
}

#[tokio::test]
async fn test_upstream_error_fails_audit_with_message() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/onpage/instant"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Target site unreachable" })),
        )
        .mount(&provider)
        .await;

    let pipeline = Pipeline::new(&provider).await;
    let use_case = AuditUseCase::new(pipeline.audit_repo.clone(), pipeline.queue.clone(), audit_settings());
    let audit = use_case
        .create_audit(
            Uuid::new_v4(),
            CreateAuditRequestDto {
                domain: "example.com".to_string(),
                keywords: Vec::new(),
                competitors: Vec::new(),
                city: None,
                state: None,
                business_name: None,
                business_location: None,
                place_id: None,
                skip_cache: false,
            },
        )
        .await
        .unwrap();

    pipeline.drain().await;

    let failed = pipeline.audit_repo.find_by_id(audit.id).await.unwrap().unwrap();
    assert_eq!(failed.status, AuditStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("Target site unreachable"));
}

/// 提交、轮询、分批拉取页面并写入摘要
#[tokio::test]
async fn test_site_scan_submits_polls_and_ingests() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/crawl/tasks"))
        .respond_with(envelope(json!({ "task_id": "task-42" })))
        .expect(1)
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/tasks/task-42"))
        .respond_with(envelope(json!({
            "finished": true,
            "pages_crawled": 3,
            "pages_in_queue": 0
        })))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/tasks/task-42/pages"))
        .and(query_param("offset", "0"))
        .respond_with(envelope(json!({
            "total_count": 3,
            "pages": [
                { "url": "https://example.com/", "status_code": 200, "checks": { "is_https": true, "canonical": true } },
                { "url": "https://example.com/about", "status_code": 200, "checks": { "canonical": false } }
            ]
        })))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/tasks/task-42/pages"))
        .and(query_param("offset", "2"))
        .respond_with(envelope(json!({
            "total_count": 3,
            "pages": [{ "url": "https://example.com/contact", "status_code": 404, "checks": { "is_4xx_code": true } }]
        })))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/crawl/tasks/task-42/summary"))
        .respond_with(envelope(json!({
            "total_pages": 3,
            "crawled_pages": 3,
            "errors_count": 1,
            "warnings_count": 4,
            "cost": 0.25
        })))
        .mount(&provider)
        .await;

    let pipeline = Pipeline::new(&provider).await;
    let use_case = ScanUseCase::new(
        pipeline.scan_repo.clone(),
        pipeline.queue.clone(),
        scan_settings(),
        ThematicScorer::default(),
    );
    let user = Uuid::new_v4();
    let scan = use_case
        .create_scan(
            user,
            CreateScanRequestDto {
                domain: "example.com".to_string(),
                max_pages: Some(10),
                enable_javascript: false,
                store_raw_html: false,
                calculate_keyword_density: false,
                start_url: None,
                audit_id: None,
                domain_entity_id: None,
            },
        )
        .await
        .unwrap();

    // site_scan 与一次 site_scan_poll
    assert_eq!(pipeline.drain().await, 2);

    let done = pipeline.scan_repo.find_by_id(scan.id).await.unwrap().unwrap();
    assert_eq!(done.status, ScanStatus::Completed);
    assert_eq!(done.task_id.as_deref(), Some("task-42"));
    assert_eq!(done.cost, Some(0.25));

    let detail = use_case.get_scan(user, scan.id).await.unwrap();
    assert_eq!(detail.pages_count, 3);
    assert_eq!(detail.summary.unwrap().warnings_count, 4);
    assert!(detail.report.is_some());
}

#[tokio::test]
async fn test_geo_grid_scan_samples_every_point() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/places/rankings"))
        .respond_with(envelope(json!({
            "results": [
                { "place_id": "rival", "name": "Rival Dental", "rank": 1, "rating": 4.9, "review_count": 300 },
                { "place_id": "place-1", "name": "Example Dental", "rank": 3 }
            ]
        })))
        .expect(9)
        .mount(&provider)
        .await;

    let pipeline = Pipeline::new(&provider).await;
    let use_case = GeoGridUseCase::new(pipeline.grid_repo.clone(), pipeline.queue.clone(), geo_grid_settings());
    let user = Uuid::new_v4();
    let campaign_id = Uuid::new_v4();
    let scan = use_case
        .create_scan(
            user,
            CreateGeoGridRequestDto {
                campaign_id,
                business_name: "Example Dental".to_string(),
                place_id: Some("place-1".to_string()),
                center_lat: 30.2672,
                center_lng: -97.7431,
                grid_size: 3,
                radius_km: Some(2.0),
                keywords: vec!["dentist".to_string()],
            },
        )
        .await
        .unwrap();

    assert_eq!(pipeline.drain().await, 1);

    let done = pipeline.grid_repo.find_by_id(scan.id).await.unwrap().unwrap();
    assert_eq!(done.status, GeoGridStatus::Completed);
    assert_eq!(pipeline.grid_repo.list_points(scan.id).await.unwrap().len(), 9);

    let report = use_case.campaign_competitors(user, campaign_id).await.unwrap();
    assert_eq!(report.scan_id, Some(scan.id));
    assert!(report.previous_scan_id.is_none());
    let rival = report
        .competitors
        .iter()
        .find(|c| c.place_id == "rival")
        .unwrap();
    assert_eq!(rival.appearances, 9);
    assert_eq!(rival.times_in_top3, 9);
    assert!(rival.rank_change.is_none());
}
