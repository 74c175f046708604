// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::geo_grid::{GeoGridScan, GridPoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 地理网格仓库特质
#[async_trait]
pub trait GeoGridRepository: Send + Sync {
    async fn create(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GeoGridScan>, RepositoryError>;

    async fn update(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError>;

    /// 删除扫描及其采样点
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 写入采样点，`(scan_id, row, col)` 已存在时跳过
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新插入
    /// * `Ok(false)` - 已存在，未做修改
    async fn upsert_point(&self, point: &GridPoint) -> Result<bool, RepositoryError>;

    /// 按行列顺序列出扫描的全部采样点
    async fn list_points(&self, scan_id: Uuid) -> Result<Vec<GridPoint>, RepositoryError>;

    /// 按完成时间倒序列出用户在活动下最近完成的扫描
    async fn latest_completed(
        &self,
        user_id: Uuid,
        campaign_id: Uuid,
        limit: u64,
    ) -> Result<Vec<GeoGridScan>, RepositoryError>;

    /// 查找在指定时间之前最后更新、仍处于非终止状态的扫描
    async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<GeoGridScan>, RepositoryError>;
}
