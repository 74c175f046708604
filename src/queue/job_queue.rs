// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 任务队列特质
///
/// 至少一次投递：任务在确认完成前崩溃会在锁过期后重新投递，
/// 处理器必须保证幂等。
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError>;

    /// 出队任务
    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError>;

    /// 确认任务完成
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;

    /// 任务最终失败
    async fn fail(&self, job_id: Uuid) -> Result<(), QueueError>;

    /// 释放任务并在 `delay` 之后重新投递
    async fn reschedule(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError>;

    /// 重新投递锁已过期的任务
    async fn reset_stuck_jobs(&self) -> Result<u64, QueueError>;
}

/// 基于数据库的任务队列实现
pub struct PostgresJobQueue<R: JobRepository> {
    repository: Arc<R>,
    lease: chrono::Duration,
}

impl<R: JobRepository> PostgresJobQueue<R> {
    /// 创建新的任务队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `lease` - 出队后的锁定时长
    pub fn new(repository: Arc<R>, lease: chrono::Duration) -> Self {
        Self { repository, lease }
    }
}

#[async_trait]
impl<R: JobRepository> JobQueue for PostgresJobQueue<R> {
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError> {
        Ok(self.repository.create(&job).await?)
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError> {
        Ok(self.repository.acquire_next(worker_id, self.lease).await?)
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_completed(job_id).await?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_failed(job_id).await?;
        Ok(())
    }

    async fn reschedule(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError> {
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        self.repository.requeue(job_id, Utc::now() + delay).await?;
        Ok(())
    }

    async fn reset_stuck_jobs(&self) -> Result<u64, QueueError> {
        Ok(self.repository.reset_stuck_jobs().await?)
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        (**self).complete(job_id).await
    }

    async fn fail(&self, job_id: Uuid) -> Result<(), QueueError> {
        (**self).fail(job_id).await
    }

    async fn reschedule(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError> {
        (**self).reschedule(job_id, delay).await
    }

    async fn reset_stuck_jobs(&self) -> Result<u64, QueueError> {
        (**self).reset_stuck_jobs().await
    }
}
