// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WatchdogSettings;
use crate::domain::repositories::audit_repository::AuditRepository;
use crate::domain::repositories::geo_grid_repository::GeoGridRepository;
use crate::domain::repositories::scan_repository::ScanRepository;
use crate::infrastructure::metrics::WATCHDOG_FAILED;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 一轮巡检的结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub audits_failed: u64,
    pub scans_failed: u64,
    pub geo_grids_failed: u64,
    pub jobs_released: u64,
}

impl SweepReport {
    pub fn records_failed(&self) -> u64 {
        self.audits_failed + self.scans_failed + self.geo_grids_failed
    }
}

/// 看门狗工作器
///
/// 定期把长时间没有进展的审计、扫描和网格扫描标记为失败，
/// 并重新投递锁已过期的任务
pub struct WatchdogWorker<AR, SR, GR, Q> {
    audits: Arc<AR>,
    scans: Arc<SR>,
    grids: Arc<GR>,
    queue: Arc<Q>,
    settings: WatchdogSettings,
}

impl<AR, SR, GR, Q> WatchdogWorker<AR, SR, GR, Q>
where
    AR: AuditRepository,
    SR: ScanRepository,
    GR: GeoGridRepository,
    Q: JobQueue,
{
    pub fn new(audits: Arc<AR>, scans: Arc<SR>, grids: Arc<GR>, queue: Arc<Q>, settings: WatchdogSettings) -> Self {
        Self {
            audits,
            scans,
            grids,
            queue,
            settings,
        }
    }

    fn timeout_message(&self) -> String {
        format!(
            "Timed out: no progress for {} seconds",
            self.settings.stale_after_seconds
        )
    }

    /// 执行一轮巡检
    pub async fn sweep(&self) -> Result<SweepReport, WorkerError> {
        let cutoff = Utc::now() - self.settings.stale_after();
        let message = self.timeout_message();
        let mut report = SweepReport::default();

        for audit in self.audits.find_stale(cutoff).await? {
            warn!("Audit {} stuck in {}, marking failed", audit.id, audit.status);
            self.audits.update(&audit.fail(message.as_str())?).await?;
            report.audits_failed += 1;
        }

        for scan in self.scans.find_stale(cutoff).await? {
            warn!("Scan {} stuck in {}, marking failed", scan.id, scan.status);
            self.scans.update(&scan.fail(message.as_str())?).await?;
            report.scans_failed += 1;
        }

        for scan in self.grids.find_stale(cutoff).await? {
            warn!("Geo-grid scan {} stuck in {}, marking failed", scan.id, scan.status);
            self.grids.update(&scan.fail(message.as_str())?).await?;
            report.geo_grids_failed += 1;
        }

        report.jobs_released = self.queue.reset_stuck_jobs().await?;
        counter!(WATCHDOG_FAILED).increment(report.records_failed());
        Ok(report)
    }
}

#[async_trait]
impl<AR, SR, GR, Q> Worker for WatchdogWorker<AR, SR, GR, Q>
where
    AR: AuditRepository + 'static,
    SR: ScanRepository + 'static,
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Watchdog worker started");

        let mut interval = tokio::time::interval(self.settings.interval());

        loop {
            interval.tick().await;

            match self.sweep().await {
                Ok(report) => {
                    if report.records_failed() > 0 || report.jobs_released > 0 {
                        info!(
                            "Watchdog failed {} stale records and released {} jobs",
                            report.records_failed(),
                            report.jobs_released
                        );
                    }
                }
                Err(e) => {
                    error!("Watchdog sweep failed: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "watchdog"
    }
}
