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

use super::job_repository::RepositoryError;
use crate::domain::models::scan::{ScanPage, ScanSummary, SiteAuditScan};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 全站扫描仓库特质
///
/// 除扫描本身外还负责扫描摘要与扫描页面的存储。页面写入必须是
/// 以 `(scan_id, url_hash)` 为键的幂等插入。
#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn create(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SiteAuditScan>, RepositoryError>;

    async fn update(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError>;

    /// 删除扫描及其摘要和页面
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<SiteAuditScan>, RepositoryError>;

    /// 批量写入页面，重复的URL被跳过
    ///
    /// # 返回值
    ///
    /// * `Ok(u64)` - 本次实际新插入的页面数
    async fn upsert_pages(&self, scan_id: Uuid, pages: &[ScanPage]) -> Result<u64, RepositoryError>;

    /// 扫描已存储的页面数
    async fn count_pages(&self, scan_id: Uuid) -> Result<u64, RepositoryError>;

    /// 按URL升序分页列出页面
    async fn list_pages(
        &self,
        scan_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ScanPage>, RepositoryError>;

    async fn find_page(&self, scan_id: Uuid, page_id: Uuid) -> Result<Option<ScanPage>, RepositoryError>;

    async fn find_page_by_hash(
        &self,
        scan_id: Uuid,
        url_hash: &str,
    ) -> Result<Option<ScanPage>, RepositoryError>;

    /// 写入扫描摘要，已存在时覆盖
    async fn save_summary(&self, summary: &ScanSummary) -> Result<(), RepositoryError>;

    async fn find_summary(&self, scan_id: Uuid) -> Result<Option<ScanSummary>, RepositoryError>;

    /// 查找在指定时间之前最后更新、仍处于非终止状态的扫描
    async fn find_stale(
        &self,
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<SiteAuditScan>, RepositoryError>;
}
