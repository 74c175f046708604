// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::audit_repository::AuditRepository;
use crate::domain::repositories::geo_grid_repository::GeoGridRepository;
use crate::domain::repositories::scan_repository::ScanRepository;
use crate::infrastructure::repositories::audit_repo_impl::AuditRepositoryImpl;
use crate::infrastructure::repositories::geo_grid_repo_impl::GeoGridRepositoryImpl;
use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::infrastructure::repositories::scan_repo_impl::ScanRepositoryImpl;
use crate::presentation::handlers::{audit_handler, geo_grid_handler, scan_handler};
use crate::queue::job_queue::{JobQueue, PostgresJobQueue};
use axum::{
    routing::{get, post},
    Router,
};

/// 生产环境使用的任务队列
pub type AppJobQueue = PostgresJobQueue<JobRepositoryImpl>;

/// 创建应用路由
///
/// 仓库、队列、配置和评分器通过 `Extension` 层注入
pub fn routes() -> Router {
    api_routes::<AuditRepositoryImpl, ScanRepositoryImpl, GeoGridRepositoryImpl, AppJobQueue>()
}

/// 按仓库与队列类型构建路由
pub fn api_routes<AR, SR, GR, Q>() -> Router
where
    AR: AuditRepository + 'static,
    SR: ScanRepository + 'static,
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let audit_routes = Router::new()
        .route(
            "/v1/audits",
            post(audit_handler::create_audit::<AR, Q>).get(audit_handler::list_audits::<AR, Q>),
        )
        .route(
            "/v1/audits/{id}",
            get(audit_handler::get_audit::<AR, Q>).delete(audit_handler::delete_audit::<AR, Q>),
        )
        .route("/v1/audits/{id}/retry", post(audit_handler::retry_audit::<AR, Q>))
        .route(
            "/v1/audits/{id}/competitors",
            get(audit_handler::get_audit_competitors::<AR, Q>),
        );

    let scan_routes = Router::new()
        .route(
            "/v1/scans",
            post(scan_handler::create_scan::<SR, Q>).get(scan_handler::list_scans::<SR, Q>),
        )
        .route(
            "/v1/scans/{id}",
            get(scan_handler::get_scan::<SR, Q>).delete(scan_handler::delete_scan::<SR, Q>),
        )
        .route("/v1/scans/{id}/pages", get(scan_handler::list_scan_pages::<SR, Q>))
        .route(
            "/v1/scans/{id}/pages/{page_id}/issues",
            get(scan_handler::get_page_issues::<SR, Q>),
        );

    let geo_grid_routes = Router::new()
        .route(
            "/v1/geo-grid/scans",
            post(geo_grid_handler::create_geo_grid_scan::<GR, Q>),
        )
        .route(
            "/v1/geo-grid/scans/{id}",
            get(geo_grid_handler::get_geo_grid_scan::<GR, Q>)
                .delete(geo_grid_handler::delete_geo_grid_scan::<GR, Q>),
        )
        .route(
            "/v1/geo-grid/campaigns/{campaign_id}/competitors",
            get(geo_grid_handler::get_campaign_competitors::<GR, Q>),
        );

    Router::new()
        .merge(public_routes)
        .merge(audit_routes)
        .merge(scan_routes)
        .merge(geo_grid_routes)
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
