// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 审计创建计数
pub const AUDITS_CREATED: &str = "audits_created_total";
/// 审计重试计数
pub const AUDIT_RETRIES: &str = "audit_retries_total";
/// 任务处理计数，带 job_type 与 outcome 标签
pub const JOBS_PROCESSED: &str = "jobs_processed_total";
/// 任务耗时
pub const JOB_DURATION: &str = "job_duration_seconds";
/// 新写入的扫描页面数
pub const SCAN_PAGES_INGESTED: &str = "scan_pages_ingested_total";
/// 已采样的网格点数
pub const GEO_GRID_POINTS_SAMPLED: &str = "geo_grid_points_sampled_total";
/// 被看门狗判定超时的记录数
pub const WATCHDOG_FAILED: &str = "watchdog_jobs_failed_total";

pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address '{}': {}", settings.address, e);
            return;
        }
    };

    // 端口被占用时只记录警告（开发/测试环境）
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(AUDITS_CREATED, "Total number of audits created");
    describe_counter!(AUDIT_RETRIES, "Total number of failed audits retried");
    describe_counter!(
        JOBS_PROCESSED,
        "Total number of jobs processed, labelled by job type and outcome"
    );
    describe_histogram!(JOB_DURATION, "Duration of job executions in seconds");
    describe_counter!(SCAN_PAGES_INGESTED, "Total number of scan pages newly stored");
    describe_counter!(GEO_GRID_POINTS_SAMPLED, "Total number of geo-grid points sampled");
    describe_counter!(
        WATCHDOG_FAILED,
        "Total number of stale audits and scans failed by the watchdog"
    );
}
