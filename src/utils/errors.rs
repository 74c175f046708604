// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::DomainError;
use crate::domain::providers::ProviderError;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::queue::job_queue::QueueError;
use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    #[error("无效的任务负载: {0}")]
    InvalidPayload(String),

    #[error("未找到: {0}")]
    NotFound(String),
}

impl WorkerError {
    /// 判断任务是否值得重新投递
    ///
    /// 存储与队列故障通常是暂时的；负载错误与状态冲突重试也不会成功
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Repository(RepositoryError::Database(_)) => true,
            WorkerError::Queue(_) => true,
            WorkerError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(e: serde_json::Error) -> Self {
        WorkerError::InvalidPayload(e.to_string())
    }
}
