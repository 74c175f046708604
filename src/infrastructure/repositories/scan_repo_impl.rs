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

use super::{decode, encode, map_update_err, parse_status, to_db_time, to_utc};
use crate::domain::models::scan::{ScanPage, ScanStatus, ScanSummary, SiteAuditScan};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::scan_repository::ScanRepository;
use crate::infrastructure::database::entities::{
    scan_page as page_entity, scan_summary as summary_entity, site_audit_scan as scan_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// 全站扫描仓库实现
#[derive(Clone)]
pub struct ScanRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ScanRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

const ACTIVE_STATUSES: [ScanStatus; 4] = [
    ScanStatus::Pending,
    ScanStatus::Submitting,
    ScanStatus::Crawling,
    ScanStatus::FetchingResults,
];

impl TryFrom<scan_entity::Model> for SiteAuditScan {
    type Error = RepositoryError;

    fn try_from(model: scan_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            domain: model.domain,
            status: parse_status(&model.status, "scan")?,
            progress: model.progress,
            task_id: model.task_id,
            config: decode(model.config, "config")?,
            audit_id: model.audit_id,
            domain_entity_id: model.domain_entity_id,
            cost: model.cost,
            error_message: model.error_message,
            created_at: to_utc(model.created_at),
            updated_at: to_utc(model.updated_at),
            started_at: model.started_at.map(to_utc),
            completed_at: model.completed_at.map(to_utc),
        })
    }
}

fn scan_active_model(scan: &SiteAuditScan) -> Result<scan_entity::ActiveModel, RepositoryError> {
    Ok(scan_entity::ActiveModel {
        id: Set(scan.id),
        user_id: Set(scan.user_id),
        domain: Set(scan.domain.clone()),
        status: Set(scan.status.to_string()),
        progress: Set(scan.progress),
        task_id: Set(scan.task_id.clone()),
        config: Set(encode(&scan.config, "config")?),
        audit_id: Set(scan.audit_id),
        domain_entity_id: Set(scan.domain_entity_id),
        cost: Set(scan.cost),
        error_message: Set(scan.error_message.clone()),
        created_at: Set(to_db_time(scan.created_at)),
        updated_at: Set(to_db_time(scan.updated_at)),
        started_at: Set(scan.started_at.map(to_db_time)),
        completed_at: Set(scan.completed_at.map(to_db_time)),
    })
}

impl TryFrom<page_entity::Model> for ScanPage {
    type Error = RepositoryError;

    fn try_from(model: page_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            scan_id: model.scan_id,
            url: model.url,
            url_hash: model.url_hash,
            status_code: model.status_code,
            score: model.score,
            title: model.title,
            description: model.description,
            h1: decode(model.h1, "h1")?,
            word_count: model.word_count,
            redirect_url: model.redirect_url,
            internal_links: model.internal_links.map(|n| n.max(0) as u32),
            external_links: model.external_links.map(|n| n.max(0) as u32),
            timing: decode(model.timing, "timing")?,
            checks: decode(model.checks, "checks")?,
            issue_types: decode(model.issue_types, "issue_types")?,
            issue_count: model.issue_count,
            created_at: to_utc(model.created_at),
        })
    }
}

fn page_active_model(page: &ScanPage) -> Result<page_entity::ActiveModel, RepositoryError> {
    Ok(page_entity::ActiveModel {
        id: Set(page.id),
        scan_id: Set(page.scan_id),
        url: Set(page.url.clone()),
        url_hash: Set(page.url_hash.clone()),
        status_code: Set(page.status_code),
        score: Set(page.score),
        title: Set(page.title.clone()),
        description: Set(page.description.clone()),
        h1: Set(encode(&page.h1, "h1")?),
        word_count: Set(page.word_count),
        redirect_url: Set(page.redirect_url.clone()),
        internal_links: Set(page.internal_links.map(|n| n as i32)),
        external_links: Set(page.external_links.map(|n| n as i32)),
        timing: Set(encode(&page.timing, "timing")?),
        checks: Set(encode(&page.checks, "checks")?),
        issue_types: Set(encode(&page.issue_types, "issue_types")?),
        issue_count: Set(page.issue_count),
        created_at: Set(to_db_time(page.created_at)),
    })
}

impl From<summary_entity::Model> for ScanSummary {
    fn from(model: summary_entity::Model) -> Self {
        Self {
            scan_id: model.scan_id,
            total_pages: model.total_pages,
            crawled_pages: model.crawled_pages,
            crawl_stop_reason: model.crawl_stop_reason,
            errors_count: model.errors_count,
            warnings_count: model.warnings_count,
            notices_count: model.notices_count,
            avg_lcp: model.avg_lcp,
            avg_cls: model.avg_cls,
            images_count: model.images_count,
            internal_links_count: model.internal_links_count,
            external_links_count: model.external_links_count,
            redirects_count: model.redirects_count,
            duplicate_titles: model.duplicate_titles,
            duplicate_descriptions: model.duplicate_descriptions,
            duplicate_content: model.duplicate_content,
            domain_info: model.domain_info,
            ssl_info: model.ssl_info,
        }
    }
}

fn summary_active_model(summary: &ScanSummary) -> summary_entity::ActiveModel {
    summary_entity::ActiveModel {
        scan_id: Set(summary.scan_id),
        total_pages: Set(summary.total_pages),
        crawled_pages: Set(summary.crawled_pages),
        crawl_stop_reason: Set(summary.crawl_stop_reason.clone()),
        errors_count: Set(summary.errors_count),
        warnings_count: Set(summary.warnings_count),
        notices_count: Set(summary.notices_count),
        avg_lcp: Set(summary.avg_lcp),
        avg_cls: Set(summary.avg_cls),
        images_count: Set(summary.images_count),
        internal_links_count: Set(summary.internal_links_count),
        external_links_count: Set(summary.external_links_count),
        redirects_count: Set(summary.redirects_count),
        duplicate_titles: Set(summary.duplicate_titles),
        duplicate_descriptions: Set(summary.duplicate_descriptions),
        duplicate_content: Set(summary.duplicate_content),
        domain_info: Set(summary.domain_info.clone()),
        ssl_info: Set(summary.ssl_info.clone()),
        created_at: Set(to_db_time(Utc::now())),
    }
}

fn collect_scans(models: Vec<scan_entity::Model>) -> Result<Vec<SiteAuditScan>, RepositoryError> {
    models.into_iter().map(SiteAuditScan::try_from).collect()
}

#[async_trait]
impl ScanRepository for ScanRepositoryImpl {
    async fn create(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError> {
        scan_active_model(scan)?.insert(self.db.as_ref()).await?;
        Ok(scan.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SiteAuditScan>, RepositoryError> {
        scan_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(SiteAuditScan::try_from)
            .transpose()
    }

    async fn update(&self, scan: &SiteAuditScan) -> Result<SiteAuditScan, RepositoryError> {
        let updated = scan_active_model(scan)?
            .update(self.db.as_ref())
            .await
            .map_err(map_update_err)?;
        updated.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        page_entity::Entity::delete_many()
            .filter(page_entity::Column::ScanId.eq(id))
            .exec(&txn)
            .await?;
        summary_entity::Entity::delete_by_id(id).exec(&txn).await?;
        let result = scan_entity::Entity::delete_by_id(id).exec(&txn).await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }
        txn.commit().await?;
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<SiteAuditScan>, RepositoryError> {
        let models = scan_entity::Entity::find()
            .filter(scan_entity::Column::UserId.eq(user_id))
            .order_by_desc(scan_entity::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        collect_scans(models)
    }

    async fn upsert_pages(&self, scan_id: Uuid, pages: &[ScanPage]) -> Result<u64, RepositoryError> {
        let mut seen = HashSet::new();
        let mut models = Vec::with_capacity(pages.len());
        for page in pages {
            if page.scan_id != scan_id || !seen.insert(page.url_hash.as_str()) {
                continue;
            }
            models.push(page_active_model(page)?);
        }
        if models.is_empty() {
            return Ok(0);
        }

        let result = page_entity::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([page_entity::Column::ScanId, page_entity::Column::UrlHash])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(inserted) => Ok(inserted),
            // 整批均为重复记录
            Err(DbErr::RecordNotInserted) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn count_pages(&self, scan_id: Uuid) -> Result<u64, RepositoryError> {
        let count = page_entity::Entity::find()
            .filter(page_entity::Column::ScanId.eq(scan_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn list_pages(
        &self,
        scan_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ScanPage>, RepositoryError> {
        page_entity::Entity::find()
            .filter(page_entity::Column::ScanId.eq(scan_id))
            .order_by_asc(page_entity::Column::Url)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScanPage::try_from)
            .collect()
    }

    async fn find_page(&self, scan_id: Uuid, page_id: Uuid) -> Result<Option<ScanPage>, RepositoryError> {
        page_entity::Entity::find_by_id(page_id)
            .filter(page_entity::Column::ScanId.eq(scan_id))
            .one(self.db.as_ref())
            .await?
            .map(ScanPage::try_from)
            .transpose()
    }

    async fn find_page_by_hash(
        &self,
        scan_id: Uuid,
        url_hash: &str,
    ) -> Result<Option<ScanPage>, RepositoryError> {
        page_entity::Entity::find()
            .filter(page_entity::Column::ScanId.eq(scan_id))
            .filter(page_entity::Column::UrlHash.eq(url_hash))
            .one(self.db.as_ref())
            .await?
            .map(ScanPage::try_from)
            .transpose()
    }

    async fn save_summary(&self, summary: &ScanSummary) -> Result<(), RepositoryError> {
        use summary_entity::Column;

        summary_entity::Entity::insert(summary_active_model(summary))
            .on_conflict(
                OnConflict::column(Column::ScanId)
                    .update_columns([
                        Column::TotalPages,
                        Column::CrawledPages,
                        Column::CrawlStopReason,
                        Column::ErrorsCount,
                        Column::WarningsCount,
                        Column::NoticesCount,
                        Column::AvgLcp,
                        Column::AvgCls,
                        Column::ImagesCount,
                        Column::InternalLinksCount,
                        Column::ExternalLinksCount,
                        Column::RedirectsCount,
                        Column::DuplicateTitles,
                        Column::DuplicateDescriptions,
                        Column::DuplicateContent,
                        Column::DomainInfo,
                        Column::SslInfo,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_summary(&self, scan_id: Uuid) -> Result<Option<ScanSummary>, RepositoryError> {
        let model = summary_entity::Entity::find_by_id(scan_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_stale(
        &self,
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<SiteAuditScan>, RepositoryError> {
        let models = scan_entity::Entity::find()
            .filter(
                scan_entity::Column::Status
                    .is_in(ACTIVE_STATUSES.iter().map(|s| s.to_string())),
            )
            .filter(scan_entity::Column::UpdatedAt.lt(to_db_time(updated_before)))
            .all(self.db.as_ref())
            .await?;
        collect_scans(models)
    }
}
