// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::setup_db;
use auditrs::domain::models::audit::{Audit, AuditStatus, BacklinksSummary, StepResult};
use auditrs::domain::repositories::audit_repository::AuditRepository;
use auditrs::domain::repositories::job_repository::RepositoryError;
use auditrs::infrastructure::repositories::audit_repo_impl::AuditRepositoryImpl;
use chrono::{Duration, Utc};
use uuid::Uuid;

fn audit_for(user_id: Uuid, domain: &str) -> Audit {
    let mut audit = Audit::new(user_id, domain.to_string());
    audit.keywords = vec!["dentist austin".to_string()];
    audit.city = Some("Austin".to_string());
    audit
}

/// 步骤结果经 JSON 列往返后保持不变
#[tokio::test]
async fn test_step_results_survive_round_trip() {
    let repo = AuditRepositoryImpl::new(setup_db().await);
    let audit = repo.create(&audit_for(Uuid::new_v4(), "example.com")).await.unwrap();

    let mut running = audit.begin_crawl().unwrap();
    running
        .record_step(StepResult::Backlinks(BacklinksSummary {
            backlinks: 420,
            referring_domains: 31,
            domain_rank: Some(18),
            referring_domain_list: vec!["news.example".to_string()],
        }))
        .unwrap();
    repo.update(&running).await.unwrap();

    let loaded = repo.find_by_id(running.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, AuditStatus::Crawling);
    assert_eq!(loaded.keywords, vec!["dentist austin".to_string()]);
    assert_eq!(loaded.step_results.backlinks().unwrap().backlinks, 420);
}

#[tokio::test]
async fn test_recent_audit_lookup_is_scoped_to_user_and_domain() {
    let repo = AuditRepositoryImpl::new(setup_db().await);
    let user = Uuid::new_v4();
    repo.create(&audit_for(user, "example.com")).await.unwrap();

    let since = Utc::now() - Duration::hours(1);
    assert!(repo
        .find_recent_for_domain(user, "example.com", since)
        .await
        .unwrap()
        .is_some());
    assert!(repo
        .find_recent_for_domain(Uuid::new_v4(), "example.com", since)
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .find_recent_for_domain(user, "other.com", since)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_by_user_is_newest_first_and_paginated() {
    let repo = AuditRepositoryImpl::new(setup_db().await);
    let user = Uuid::new_v4();
    let mut older = audit_for(user, "a.com");
    older.created_at = Utc::now() - Duration::minutes(5);
    repo.create(&older).await.unwrap();
    repo.create(&audit_for(user, "b.com")).await.unwrap();
    repo.create(&audit_for(Uuid::new_v4(), "c.com")).await.unwrap();

    let page = repo.list_by_user(user, 10, 0).await.unwrap();
    assert_eq!(
        page.iter().map(|a| a.domain.as_str()).collect::<Vec<_>>(),
        vec!["b.com", "a.com"]
    );
    assert_eq!(repo.list_by_user(user, 1, 1).await.unwrap()[0].domain, "a.com");
}

#[tokio::test]
async fn test_find_stale_ignores_terminal_audits() {
    let repo = AuditRepositoryImpl::new(setup_db().await);
    let user = Uuid::new_v4();

    let mut stuck = audit_for(user, "stuck.com").begin_crawl().unwrap();
    stuck.updated_at = Utc::now() - Duration::hours(3);
    repo.create(&stuck).await.unwrap();

    let mut finished = audit_for(user, "done.com").begin_crawl().unwrap().fail("boom").unwrap();
    finished.updated_at = Utc::now() - Duration::hours(3);
    repo.create(&finished).await.unwrap();

    let stale = repo
        .find_stale(Utc::now() - Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].domain, "stuck.com");
}

#[tokio::test]
async fn test_delete_missing_audit_is_not_found() {
    let repo = AuditRepositoryImpl::new(setup_db().await);
    assert!(matches!(
        repo.delete(Uuid::new_v4()).await,
        Err(RepositoryError::NotFound)
    ));
}
