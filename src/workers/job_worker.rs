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
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::job::{Job, JobType};
use crate::infrastructure::metrics::{JOBS_PROCESSED, JOB_DURATION};
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::{JobHandler, Worker};

/// 按任务类型划分的执行器集合
#[derive(Clone)]
pub struct JobHandlers {
    pub audit: Arc<dyn JobHandler>,
    pub scan: Arc<dyn JobHandler>,
    pub geo_grid: Arc<dyn JobHandler>,
}

impl JobHandlers {
    pub fn route(&self, job_type: JobType) -> &Arc<dyn JobHandler> {
        match job_type {
            JobType::Audit => &self.audit,
            JobType::SiteScan | JobType::SiteScanPoll => &self.scan,
            JobType::GeoGrid => &self.geo_grid,
        }
    }
}

/// 任务处理结果，用作指标标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Rescheduled,
    Failed,
}

impl JobOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Rescheduled => "rescheduled",
            JobOutcome::Failed => "failed",
        }
    }
}

/// 任务工作者
///
/// 从队列取出到期任务并交给对应执行器。执行失败时，可重试的错误
/// 按退避时间重新排期，否则通知执行器放弃并把任务标记为失败。
pub struct JobWorker<Q: JobQueue> {
    queue: Arc<Q>,
    handlers: JobHandlers,
    retry: RetryPolicy,
    idle_poll_interval: Duration,
    worker_id: Uuid,
    name: String,
}

impl<Q: JobQueue> JobWorker<Q> {
    pub fn new(queue: Arc<Q>, handlers: JobHandlers, idle_poll_interval: Duration) -> Self {
        let worker_id = Uuid::new_v4();
        Self {
            queue,
            handlers,
            retry: RetryPolicy::for_jobs(),
            idle_poll_interval,
            worker_id,
            name: format!("job-worker-{}", worker_id),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 处理一个到期任务，队列为空时返回 false
    pub async fn process_next(&self) -> Result<bool, WorkerError> {
        let Some(job) = self.queue.dequeue(self.worker_id).await? else {
            return Ok(false);
        };
        self.process_job(job).await?;
        Ok(true)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type, attempt = job.attempt_count))]
    pub async fn process_job(&self, job: Job) -> Result<JobOutcome, WorkerError> {
        let started = Instant::now();
        let handler = self.handlers.route(job.job_type);

        let outcome = match handler.handle(&job).await {
            Ok(()) => {
                self.queue.complete(job.id).await?;
                JobOutcome::Completed
            }
            Err(e) if e.is_retryable() && job.can_retry() => {
                let delay = self.retry.calculate_backoff(job.attempt_count.max(1) as u32);
                warn!("Job failed, retrying in {:?}: {}", delay, e);
                self.queue.reschedule(job.id, delay).await?;
                JobOutcome::Rescheduled
            }
            Err(e) => {
                error!("Job failed permanently: {}", e);
                if let Err(abandon_err) = handler.abandon(&job, &e.to_string()).await {
                    error!("Failed to mark job target as failed: {}", abandon_err);
                }
                self.queue.fail(job.id).await?;
                JobOutcome::Failed
            }
        };

        let job_type = job.job_type.to_string();
        counter!(JOBS_PROCESSED, "job_type" => job_type.clone(), "outcome" => outcome.as_str())
            .increment(1);
        histogram!(JOB_DURATION, "job_type" => job_type).record(started.elapsed().as_secs_f64());
        Ok(outcome)
    }
}

#[async_trait]
impl<Q: JobQueue + 'static> Worker for JobWorker<Q> {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Job worker {} started", self.worker_id);

        loop {
            match self.process_next().await {
                Ok(true) => {}
                Ok(false) => sleep(self.idle_poll_interval).await,
                Err(e) => {
                    error!("Error processing job: {}", e);
                    sleep(self.idle_poll_interval).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
