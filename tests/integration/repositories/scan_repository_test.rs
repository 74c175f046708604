// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::setup_db;
use auditrs::domain::models::scan::{url_hash, CrawlConfig, CrawledPage, ScanPage, SiteAuditScan};
use auditrs::domain::providers::CrawlSummaryRecord;
use auditrs::domain::repositories::scan_repository::ScanRepository;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

fn page(scan_id: Uuid, url: &str) -> ScanPage {
    let mut checks = BTreeMap::new();
    checks.insert("canonical".to_string(), json!(false));
    checks.insert("is_https".to_string(), json!(true));
    ScanPage::from_crawled(
        scan_id,
        CrawledPage {
            url: url.to_string(),
            status_code: Some(200),
            checks,
            ..Default::default()
        },
    )
}

async fn stored_scan(repo: &ScanRepositoryImpl) -> SiteAuditScan {
    let scan = SiteAuditScan::new(Uuid::new_v4(), "example.com".to_string(), CrawlConfig::default());
    repo.create(&scan).await.unwrap()
}

/// 重复投递同一批页面不会产生重复行
#[tokio::test]
async fn test_page_reingest_is_idempotent() {
    let repo = ScanRepositoryImpl::new(setup_db().await);
    let scan = stored_scan(&repo).await;

    let batch = vec![
        page(scan.id, "https://example.com/"),
        page(scan.id, "https://example.com/about"),
    ];
    assert_eq!(repo.upsert_pages(scan.id, &batch).await.unwrap(), 2);

    let redelivered = vec![
        page(scan.id, "https://example.com/"),
        page(scan.id, "https://example.com/about"),
        page(scan.id, "https://example.com/contact"),
    ];
    assert_eq!(repo.upsert_pages(scan.id, &redelivered).await.unwrap(), 1);
    assert_eq!(repo.upsert_pages(scan.id, &redelivered).await.unwrap(), 0);
    assert_eq!(repo.count_pages(scan.id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_pages_are_listed_by_url_and_found_by_hash() {
    let repo = ScanRepositoryImpl::new(setup_db().await);
    let scan = stored_scan(&repo).await;
    repo.upsert_pages(
        scan.id,
        &[
            page(scan.id, "https://example.com/z"),
            page(scan.id, "https://example.com/a"),
        ],
    )
    .await
    .unwrap();

    let pages = repo.list_pages(scan.id, 10, 0).await.unwrap();
    assert_eq!(pages[0].url, "https://example.com/a");
    assert_eq!(pages[0].issue_types, vec!["canonical".to_string()]);

    let by_hash = repo
        .find_page_by_hash(scan.id, &url_hash("https://example.com/z"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_hash.url, "https://example.com/z");
    assert!(repo.find_page(scan.id, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_summary_is_overwritten_on_save() {
    let repo = ScanRepositoryImpl::new(setup_db().await);
    let scan = stored_scan(&repo).await;

    let first = CrawlSummaryRecord {
        total_pages: 10,
        crawled_pages: 4,
        ..Default::default()
    };
    repo.save_summary(&first.into_summary(scan.id)).await.unwrap();

    let second = CrawlSummaryRecord {
        total_pages: 10,
        crawled_pages: 10,
        warnings_count: 7,
        ..Default::default()
    };
    repo.save_summary(&second.into_summary(scan.id)).await.unwrap();

    let summary = repo.find_summary(scan.id).await.unwrap().unwrap();
    assert_eq!(summary.crawled_pages, 10);
    assert_eq!(summary.warnings_count, 7);
}

#[tokio::test]
async fn test_delete_removes_pages_and_summary() {
    let repo = ScanRepositoryImpl::new(setup_db().await);
    let scan = stored_scan(&repo).await;
    repo.upsert_pages(scan.id, &[page(scan.id, "https://example.com/")])
        .await
        .unwrap();
    repo.save_summary(&CrawlSummaryRecord::default().into_summary(scan.id))
        .await
        .unwrap();

    repo.delete(scan.id).await.unwrap();

    assert!(repo.find_by_id(scan.id).await.unwrap().is_none());
    assert_eq!(repo.count_pages(scan.id).await.unwrap(), 0);
    assert!(repo.find_summary(scan.id).await.unwrap().is_none());
}
