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

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::settings::ScanSettings;
use crate::domain::models::job::{Job, JobType, ScanJobPayload};
use crate::domain::models::scan::{ScanPage, ScanStatus, SiteAuditScan};
use crate::domain::providers::{CrawlProvider, CrawlTaskStatus};
use crate::domain::repositories::scan_repository::ScanRepository;
use crate::infrastructure::metrics::SCAN_PAGES_INGESTED;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::JobHandler;

/// 抓取阶段占用的进度上限，其余进度留给结果拉取
const CRAWL_PROGRESS_CAP: i64 = 80;
/// 拉取阶段的最大进度，100 只在完成时写入
const FETCH_PROGRESS_CAP: i64 = 99;

/// 远程抓取阶段的进度
pub fn crawl_progress(status: &CrawlTaskStatus) -> i64 {
    let seen = status.pages_crawled as i64 + status.pages_in_queue as i64;
    if seen == 0 {
        return 0;
    }
    (status.pages_crawled as i64 * CRAWL_PROGRESS_CAP / seen).min(CRAWL_PROGRESS_CAP)
}

/// 结果拉取阶段的进度
pub fn fetch_progress(fetched: u64, total: u64) -> i64 {
    if total == 0 {
        return FETCH_PROGRESS_CAP;
    }
    let span = (FETCH_PROGRESS_CAP - CRAWL_PROGRESS_CAP) as u64;
    (CRAWL_PROGRESS_CAP + (fetched.min(total) * span / total) as i64).min(FETCH_PROGRESS_CAP)
}

/// 全站扫描执行器
///
/// `site_scan` 任务提交远程抓取，`site_scan_poll` 任务轮询进度，
/// 抓取结束后分批拉取页面、写入摘要并完成扫描。
pub struct ScanExecutor<SR, CP, Q> {
    scan_repo: Arc<SR>,
    crawl: Arc<CP>,
    queue: Arc<Q>,
    settings: ScanSettings,
}

impl<SR, CP, Q> ScanExecutor<SR, CP, Q>
where
    SR: ScanRepository,
    CP: CrawlProvider,
    Q: JobQueue,
{
    pub fn new(scan_repo: Arc<SR>, crawl: Arc<CP>, queue: Arc<Q>, settings: ScanSettings) -> Self {
        Self {
            scan_repo,
            crawl,
            queue,
            settings,
        }
    }

    async fn fail(&self, scan: SiteAuditScan, message: impl Into<String>) -> Result<(), WorkerError> {
        let message = message.into();
        warn!("Scan {} failed: {}", scan.id, message);
        self.scan_repo.update(&scan.fail(message)?).await?;
        Ok(())
    }

    async fn schedule_poll(&self, scan_id: uuid::Uuid, poll_attempt: u32) -> Result<(), WorkerError> {
        self.queue
            .enqueue(Job::site_scan_poll(scan_id, poll_attempt, self.settings.poll_interval()))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, scan), fields(scan_id = %scan.id))]
    async fn submit(&self, mut scan: SiteAuditScan) -> Result<(), WorkerError> {
        if scan.status == ScanStatus::Pending {
            scan = self.scan_repo.update(&scan.submit()?).await?;
        }

        if scan.status == ScanStatus::Submitting {
            match self.crawl.submit_crawl(&scan.domain, &scan.config).await {
                Ok(task_id) => {
                    info!("Scan {} accepted as remote task {}", scan.id, task_id);
                    scan = self.scan_repo.update(&scan.accept(task_id)?).await?;
                }
                Err(e) => return self.fail(scan, e.to_string()).await,
            }
        }

        self.schedule_poll(scan.id, 1).await
    }

    #[instrument(skip(self, scan), fields(scan_id = %scan.id))]
    async fn poll(&self, mut scan: SiteAuditScan, poll_attempt: u32) -> Result<(), WorkerError> {
        let Some(task_id) = scan.task_id.clone() else {
            return self.fail(scan, "remote task id missing").await;
        };

        if scan.status == ScanStatus::Crawling {
            let status = match self.crawl.crawl_status(&task_id).await {
                Ok(status) => status,
                Err(e) => return self.fail(scan, e.to_string()).await,
            };

            if !status.finished {
                if poll_attempt >= self.settings.max_poll_attempts {
                    let message = format!(
                        "crawl did not finish after {} status checks",
                        self.settings.max_poll_attempts
                    );
                    return self.fail(scan, message).await;
                }
                // 进度不变时也刷新 updated_at，避免被看门狗判定为停滞
                let progress = crawl_progress(&status).max(scan.progress as i64);
                scan.set_progress(progress);
                self.scan_repo.update(&scan).await?;
                debug!(
                    "Scan {} still crawling ({} crawled, {} queued)",
                    scan.id, status.pages_crawled, status.pages_in_queue
                );
                return self.schedule_poll(scan.id, poll_attempt + 1).await;
            }

            scan = self.scan_repo.update(&scan.begin_fetching()?).await?;
        }

        if scan.status == ScanStatus::FetchingResults {
            return self.ingest(scan, &task_id).await;
        }
        Ok(())
    }

    /// 分批拉取页面并完成扫描
    ///
    /// 页面按 (scan_id, url_hash) 去重写入，重复投递不会产生重复行。
    async fn ingest(&self, mut scan: SiteAuditScan, task_id: &str) -> Result<(), WorkerError> {
        let batch_size = self.settings.page_batch_size.max(1);
        let mut offset: u32 = 0;

        loop {
            let batch = match self.crawl.fetch_pages(task_id, offset, batch_size).await {
                Ok(batch) => batch,
                Err(e) => return self.fail(scan, e.to_string()).await,
            };
            if batch.pages.is_empty() {
                break;
            }

            let received = batch.pages.len() as u32;
            let pages: Vec<ScanPage> = batch
                .pages
                .into_iter()
                .map(|page| ScanPage::from_crawled(scan.id, page))
                .collect();
            let inserted = self.scan_repo.upsert_pages(scan.id, &pages).await?;
            counter!(SCAN_PAGES_INGESTED).increment(inserted);

            offset += received;
            let total = batch.total_count.max(offset as u64);
            scan.advance_progress(fetch_progress(offset as u64, total));
            scan = self.scan_repo.update(&scan).await?;

            if offset as u64 >= batch.total_count || received < batch_size {
                break;
            }
        }

        let record = match self.crawl.fetch_summary(task_id).await {
            Ok(record) => record,
            Err(e) => return self.fail(scan, e.to_string()).await,
        };
        let cost = record.cost;
        self.scan_repo.save_summary(&record.into_summary(scan.id)).await?;

        let scan = self.scan_repo.update(&scan.complete(true, cost)?).await?;
        info!("Scan {} completed with {} pages fetched", scan.id, offset);
        Ok(())
    }
}

#[async_trait]
impl<SR, CP, Q> JobHandler for ScanExecutor<SR, CP, Q>
where
    SR: ScanRepository,
    CP: CrawlProvider,
    Q: JobQueue,
{
    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type))]
    async fn handle(&self, job: &Job) -> Result<(), WorkerError> {
        let payload: ScanJobPayload = job.payload_as()?;
        let Some(scan) = self.scan_repo.find_by_id(payload.scan_id).await? else {
            warn!("Scan {} no longer exists, dropping job", payload.scan_id);
            return Ok(());
        };
        if scan.status.is_terminal() {
            info!("Scan {} already {}, nothing to do", scan.id, scan.status);
            return Ok(());
        }

        match job.job_type {
            JobType::SiteScan => self.submit(scan).await,
            JobType::SiteScanPoll => self.poll(scan, payload.poll_attempt).await,
            other => Err(WorkerError::InvalidPayload(format!(
                "scan executor cannot run {} jobs",
                other
            ))),
        }
    }

    async fn abandon(&self, job: &Job, reason: &str) -> Result<(), WorkerError> {
        let payload: ScanJobPayload = job.payload_as()?;
        if let Some(scan) = self.scan_repo.find_by_id(payload.scan_id).await? {
            if !scan.status.is_terminal() {
                self.scan_repo.update(&scan.fail(reason)?).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scan_executor_test.rs"]
mod tests;
