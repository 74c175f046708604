// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::audit::Audit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 审计仓库特质
///
/// 定义审计数据访问接口。所有写操作都针对单行进行。
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// 创建审计
    async fn create(&self, audit: &Audit) -> Result<Audit, RepositoryError>;

    /// 根据ID查找审计
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Audit))` - 找到时返回审计实体
    /// * `Ok(None)` - 未找到
    /// * `Err(RepositoryError)` - 查询失败
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Audit>, RepositoryError>;

    /// 更新审计（整行写入）
    async fn update(&self, audit: &Audit) -> Result<Audit, RepositoryError>;

    /// 删除审计
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 按创建时间倒序列出用户的审计
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Audit>, RepositoryError>;

    /// 查找用户在指定时间之后为同一域名创建的最近一次审计
    ///
    /// 用于重复提交冷却判断。
    async fn find_recent_for_domain(
        &self,
        user_id: Uuid,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Audit>, RepositoryError>;

    /// 查找在指定时间之前最后更新、仍处于非终止状态的审计
    async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<Audit>, RepositoryError>;
}
