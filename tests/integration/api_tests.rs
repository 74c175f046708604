// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use auditrs::domain::models::audit::{Audit, AuditStatus};
use auditrs::domain::repositories::audit_repository::AuditRepository;
use auditrs::infrastructure::database::entities::job;
use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use uuid::Uuid;

const USER_HEADER: &str = "X-User-Id";

#[tokio::test]
async fn test_health_and_version() {
    let app = create_test_app().await;

    let health = app.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.text(), "OK");

    let version = app.server.get("/v1/version").await;
    assert_eq!(version.text(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_user_header_is_rejected() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/audits")
        .json(&json!({ "domain": "example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("X-User-Id"));
}

/// 冷却期内重复提交同一域名返回 429，跳过缓存时放行
#[tokio::test]
async fn test_create_audit_enforces_cooldown() {
    let app = create_test_app().await;
    let user = Uuid::new_v4().to_string();

    let created = app
        .server
        .post("/v1/audits")
        .add_header(USER_HEADER, user.clone())
        .json(&json!({
            "domain": "https://Example-Dental.com/pricing",
            "city": "Austin",
            "state": "TX"
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["domain"], "example-dental.com");

    let repeated = app
        .server
        .post("/v1/audits")
        .add_header(USER_HEADER, user.clone())
        .json(&json!({ "domain": "example-dental.com" }))
        .await;
    assert_eq!(repeated.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(repeated.headers().contains_key("retry-after"));

    let forced = app
        .server
        .post("/v1/audits")
        .add_header(USER_HEADER, user)
        .json(&json!({ "domain": "example-dental.com", "skip_cache": true }))
        .await;
    assert_eq!(forced.status_code(), StatusCode::CREATED);

    let jobs = job::Entity::find().count(app.db.as_ref()).await.unwrap();
    assert_eq!(jobs, 2);
}

#[tokio::test]
async fn test_invalid_domain_is_bad_request() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/audits")
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .json(&json!({ "domain": "not a domain" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_ownership_is_enforced() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();
    let audit = app
        .audit_repo
        .create(&Audit::new(owner, "example.com".to_string()))
        .await
        .unwrap();

    let own = app
        .server
        .get(&format!("/v1/audits/{}", audit.id))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(own.status_code(), StatusCode::OK);

    let foreign = app
        .server
        .get(&format!("/v1/audits/{}", audit.id))
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .await;
    assert_eq!(foreign.status_code(), StatusCode::FORBIDDEN);

    let missing = app
        .server
        .get(&format!("/v1/audits/{}", Uuid::new_v4()))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_retry_only_accepts_failed_audits() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();
    let running = app
        .audit_repo
        .create(&Audit::new(owner, "running.com".to_string()).begin_crawl().unwrap())
        .await
        .unwrap();
    let failed = app
        .audit_repo
        .create(
            &Audit::new(owner, "failed.com".to_string())
                .begin_crawl()
                .unwrap()
                .fail("Daily quota exhausted")
                .unwrap(),
        )
        .await
        .unwrap();

    let rejected = app
        .server
        .post(&format!("/v1/audits/{}/retry", running.id))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(rejected.status_code(), StatusCode::CONFLICT);
    let unchanged = app.audit_repo.find_by_id(running.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, AuditStatus::Crawling);

    let accepted = app
        .server
        .post(&format!("/v1/audits/{}/retry", failed.id))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(accepted.status_code(), StatusCode::ACCEPTED);
    let body: Value = accepted.json();
    assert_eq!(body["status"], "pending");
    assert!(body["error_message"].is_null());
}

#[tokio::test]
async fn test_list_and_delete_audits() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();
    let audit = app
        .audit_repo
        .create(&Audit::new(owner, "a.com".to_string()))
        .await
        .unwrap();
    app.audit_repo
        .create(&Audit::new(Uuid::new_v4(), "b.com".to_string()))
        .await
        .unwrap();

    let list = app
        .server
        .get("/v1/audits")
        .add_query_param("limit", 10)
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(list.status_code(), StatusCode::OK);
    let body: Value = list.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["limit"], 10);

    let deleted = app
        .server
        .delete(&format!("/v1/audits/{}", audit.id))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = app
        .server
        .get(&format!("/v1/audits/{}/competitors", audit.id))
        .add_header(USER_HEADER, owner.to_string())
        .await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_endpoints() {
    let app = create_test_app().await;
    let user = Uuid::new_v4().to_string();

    let created = app
        .server
        .post("/v1/scans")
        .add_header(USER_HEADER, user.clone())
        .json(&json!({ "domain": "example.com", "max_pages": 50 }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let scan: Value = created.json();
    let scan_id = scan["id"].as_str().unwrap().to_string();

    let detail = app
        .server
        .get(&format!("/v1/scans/{}", scan_id))
        .add_header(USER_HEADER, user.clone())
        .await;
    assert_eq!(detail.status_code(), StatusCode::OK);
    let detail: Value = detail.json();
    assert_eq!(detail["pages_count"], 0);
    assert!(detail["summary"].is_null());

    let pages = app
        .server
        .get(&format!("/v1/scans/{}/pages", scan_id))
        .add_header(USER_HEADER, user.clone())
        .await;
    let pages: Value = pages.json();
    assert_eq!(pages["total"], 0);

    let issues = app
        .server
        .get(&format!("/v1/scans/{}/pages/{}/issues", scan_id, Uuid::new_v4()))
        .add_header(USER_HEADER, user.clone())
        .await;
    assert_eq!(issues.status_code(), StatusCode::NOT_FOUND);

    let foreign = app
        .server
        .delete(&format!("/v1/scans/{}", scan_id))
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .await;
    assert_eq!(foreign.status_code(), StatusCode::FORBIDDEN);

    let deleted = app
        .server
        .delete(&format!("/v1/scans/{}", scan_id))
        .add_header(USER_HEADER, user)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_geo_grid_endpoints() {
    let app = create_test_app().await;
    let user = Uuid::new_v4().to_string();
    let campaign_id = Uuid::new_v4();

    let even = app
        .server
        .post("/v1/geo-grid/scans")
        .add_header(USER_HEADER, user.clone())
        .json(&json!({
            "campaign_id": campaign_id,
            "business_name": "Example Dental",
            "center_lat": 30.2672,
            "center_lng": -97.7431,
            "grid_size": 4,
            "keywords": ["dentist"]
        }))
        .await;
    assert_eq!(even.status_code(), StatusCode::BAD_REQUEST);

    let created = app
        .server
        .post("/v1/geo-grid/scans")
        .add_header(USER_HEADER, user.clone())
        .json(&json!({
            "campaign_id": campaign_id,
            "business_name": "Example Dental",
            "center_lat": 30.2672,
            "center_lng": -97.7431,
            "grid_size": 5,
            "keywords": ["dentist", " Dentist "]
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let scan: Value = created.json();
    assert_eq!(scan["radius_km"], 5.0);

    let detail = app
        .server
        .get(&format!("/v1/geo-grid/scans/{}", scan["id"].as_str().unwrap()))
        .add_header(USER_HEADER, user.clone())
        .await;
    assert_eq!(detail.status_code(), StatusCode::OK);
    let detail: Value = detail.json();
    assert!(detail["points"].as_array().unwrap().is_empty());

    // 尚无完成的扫描
    let competitors = app
        .server
        .get(&format!("/v1/geo-grid/campaigns/{}/competitors", campaign_id))
        .add_header(USER_HEADER, user)
        .await;
    assert_eq!(competitors.status_code(), StatusCode::OK);
    let competitors: Value = competitors.json();
    assert!(competitors["competitors"].as_array().unwrap().is_empty());
    assert!(competitors["scan_id"].is_null());
}
