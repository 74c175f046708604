// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储的数据无法转换为领域对象
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

/// 任务消息仓库特质
///
/// 定义任务消息的数据访问接口
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;

    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;

    /// 获取下一个到期的待处理任务并加锁
    ///
    /// # 参数
    ///
    /// * `worker_id` - 持有锁的工作器ID
    /// * `lease` - 锁定时长，过期后任务可被重新投递
    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lease: chrono::Duration,
    ) -> Result<Option<Job>, RepositoryError>;

    /// 标记任务已完成
    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 标记任务已失败
    async fn mark_failed(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 释放锁并重新排期
    async fn requeue(&self, id: Uuid, run_at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// 重置锁已过期的活动任务，返回重置数量
    async fn reset_stuck_jobs(&self) -> Result<u64, RepositoryError>;
}
