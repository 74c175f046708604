// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use auditrs::config::settings::{AuditSettings, GeoGridSettings, ScanSettings};
use auditrs::domain::services::thematic_scorer::ThematicScorer;
use auditrs::infrastructure::repositories::audit_repo_impl::AuditRepositoryImpl;
use auditrs::infrastructure::repositories::geo_grid_repo_impl::GeoGridRepositoryImpl;
use auditrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use auditrs::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use auditrs::presentation::routes::{self, AppJobQueue};
use axum::Extension;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

/// 每个测试独占一个内存数据库
///
/// 内存库只存在于单个连接内，连接池固定为一个连接
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None).await.expect("failed to run migrations");
    Arc::new(db)
}

pub fn audit_settings() -> AuditSettings {
    AuditSettings {
        cooldown_seconds: 3600,
        max_keywords: 20,
        max_competitors: 5,
    }
}

pub fn scan_settings() -> ScanSettings {
    ScanSettings {
        page_batch_size: 2,
        poll_interval_seconds: 0,
        max_poll_attempts: 10,
        default_max_pages: 100,
    }
}

pub fn geo_grid_settings() -> GeoGridSettings {
    GeoGridSettings {
        max_grid_size: 15,
        default_radius_km: 5.0,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub audit_repo: Arc<AuditRepositoryImpl>,
    pub scan_repo: Arc<ScanRepositoryImpl>,
    pub grid_repo: Arc<GeoGridRepositoryImpl>,
    pub job_repo: Arc<JobRepositoryImpl>,
    pub queue: Arc<AppJobQueue>,
}

pub async fn create_test_app() -> TestApp {
    let db = setup_db().await;
    let audit_repo = Arc::new(AuditRepositoryImpl::new(db.clone()));
    let scan_repo = Arc::new(ScanRepositoryImpl::new(db.clone()));
    let grid_repo = Arc::new(GeoGridRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let queue = Arc::new(AppJobQueue::new(job_repo.clone(), chrono::Duration::minutes(10)));

    let app = routes::routes()
        .layer(Extension(audit_repo.clone()))
        .layer(Extension(scan_repo.clone()))
        .layer(Extension(grid_repo.clone()))
        .layer(Extension(queue.clone()))
        .layer(Extension(audit_settings()))
        .layer(Extension(scan_settings()))
        .layer(Extension(geo_grid_settings()))
        .layer(Extension(ThematicScorer::default()));

    let server = TestServer::new(app).expect("failed to start test server");

    TestApp {
        server,
        db,
        audit_repo,
        scan_repo,
        grid_repo,
        job_repo,
        queue,
    }
}
