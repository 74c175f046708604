// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// Worker trait定义
///
/// 所有后台工作器都必须实现此trait
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器，正常情况下不会返回
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}

/// 任务执行器
///
/// 同一任务可能被投递多次，执行器的每个外部可见写入都必须幂等。
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// 执行一次任务
    async fn handle(&self, job: &Job) -> Result<(), WorkerError>;

    /// 任务不再重试时调用，把对应的业务记录置为失败
    async fn abandon(&self, job: &Job, reason: &str) -> Result<(), WorkerError>;
}
