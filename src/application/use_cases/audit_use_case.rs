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

use crate::{
    application::dto::{
        audit_request::{CreateAuditRequestDto, ListQueryDto},
        report_response::AuditCompetitorsResponse,
    },
    config::settings::AuditSettings,
    domain::{
        models::{audit::Audit, job::Job, DomainError},
        repositories::{audit_repository::AuditRepository, job_repository::RepositoryError},
        services::{audit_report, keyword_planner},
    },
    infrastructure::metrics::{AUDITS_CREATED, AUDIT_RETRIES},
    queue::job_queue::{JobQueue, QueueError},
    utils::validators::normalize_domain,
};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum AuditUseCaseError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Audit not found")]
    NotFound,
    #[error("Audit belongs to another user")]
    Forbidden,
    #[error("{0}")]
    InvalidStatus(String),
    #[error("{domain} was audited recently; retry in {retry_after_seconds}s or set skip_cache")]
    RateLimited {
        domain: String,
        retry_after_seconds: i64,
    },
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl From<DomainError> for AuditUseCaseError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ValidationError(msg) => AuditUseCaseError::Validation(msg),
            DomainError::InvalidStatus(msg) => AuditUseCaseError::InvalidStatus(msg),
            other => AuditUseCaseError::InvalidStatus(other.to_string()),
        }
    }
}

pub struct AuditUseCase<AR, Q> {
    audit_repo: Arc<AR>,
    queue: Arc<Q>,
    settings: AuditSettings,
}

impl<AR, Q> AuditUseCase<AR, Q>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    pub fn new(audit_repo: Arc<AR>, queue: Arc<Q>, settings: AuditSettings) -> Self {
        Self {
            audit_repo,
            queue,
            settings,
        }
    }

    /// 创建审计并投递执行任务
    ///
    /// 冷却时间内对同一域名的重复提交会被拒绝，除非请求跳过缓存
    pub async fn create_audit(
        &self,
        user_id: Uuid,
        dto: CreateAuditRequestDto,
    ) -> Result<Audit, AuditUseCaseError> {
        dto.validate()
            .map_err(|e| AuditUseCaseError::Validation(e.to_string()))?;

        let domain = normalize_domain(&dto.domain)
            .map_err(|e| AuditUseCaseError::Validation(e.to_string()))?;

        let mut competitors: Vec<String> = Vec::new();
        for raw in &dto.competitors {
            let competitor = normalize_domain(raw)
                .map_err(|e| AuditUseCaseError::Validation(e.to_string()))?;
            if competitor != domain && !competitors.contains(&competitor) {
                competitors.push(competitor);
            }
        }
        competitors.truncate(self.settings.max_competitors);

        if !dto.skip_cache {
            let now = Utc::now();
            let cooldown = self.settings.cooldown();
            if let Some(recent) = self
                .audit_repo
                .find_recent_for_domain(user_id, &domain, now - cooldown)
                .await?
            {
                let retry_after = (recent.created_at + cooldown - now).num_seconds().max(1);
                return Err(AuditUseCaseError::RateLimited {
                    domain,
                    retry_after_seconds: retry_after,
                });
            }
        }

        let mut audit = Audit::new(user_id, domain);
        audit.keywords = keyword_planner::normalize_keywords(&dto.keywords, self.settings.max_keywords);
        audit.competitors = competitors;
        audit.city = dto.city;
        audit.state = dto.state;
        audit.business_name = dto.business_name;
        audit.business_location = dto.business_location;
        audit.place_id = dto.place_id;

        let audit = self.audit_repo.create(&audit).await?;
        if let Err(e) = self.queue.enqueue(Job::audit(audit.id, dto.skip_cache)).await {
            // 没有任务的审计会一直停在PENDING并触发冷却，投递失败时删除
            if let Err(cleanup) = self.audit_repo.delete(audit.id).await {
                error!("Failed to remove audit {} after enqueue error: {}", audit.id, cleanup);
            }
            return Err(e.into());
        }
        counter!(AUDITS_CREATED).increment(1);

        info!(
            "Audit {} created for {} (skip_cache={})",
            audit.id, audit.domain, dto.skip_cache
        );
        Ok(audit)
    }

    /// 获取审计，校验归属
    pub async fn get_audit(&self, user_id: Uuid, id: Uuid) -> Result<Audit, AuditUseCaseError> {
        let audit = self
            .audit_repo
            .find_by_id(id)
            .await?
            .ok_or(AuditUseCaseError::NotFound)?;
        if audit.user_id != user_id {
            return Err(AuditUseCaseError::Forbidden);
        }
        Ok(audit)
    }

    pub async fn list_audits(
        &self,
        user_id: Uuid,
        query: &ListQueryDto,
    ) -> Result<Vec<Audit>, AuditUseCaseError> {
        query
            .validate()
            .map_err(|e| AuditUseCaseError::Validation(e.to_string()))?;
        Ok(self
            .audit_repo
            .list_by_user(user_id, query.limit(), query.offset())
            .await?)
    }

    /// 重试失败的审计
    ///
    /// 非FAILED状态直接拒绝且不修改任何数据；成功时重新投递的任务强制跳过缓存
    pub async fn retry_audit(&self, user_id: Uuid, id: Uuid) -> Result<Audit, AuditUseCaseError> {
        let failed = self.get_audit(user_id, id).await?;
        let audit = self.audit_repo.update(&failed.clone().retry()?).await?;
        if let Err(e) = self.queue.enqueue(Job::audit(audit.id, true)).await {
            // 恢复为FAILED，调用方可以再次重试
            if let Err(restore) = self.audit_repo.update(&failed).await {
                error!("Failed to restore audit {} after enqueue error: {}", audit.id, restore);
            }
            return Err(e.into());
        }
        counter!(AUDIT_RETRIES).increment(1);

        info!("Audit {} reset to pending for retry", audit.id);
        Ok(audit)
    }

    pub async fn delete_audit(&self, user_id: Uuid, id: Uuid) -> Result<(), AuditUseCaseError> {
        self.get_audit(user_id, id).await?;
        self.audit_repo.delete(id).await?;
        info!("Audit {} deleted", id);
        Ok(())
    }

    /// 竞争对手对比与外链差距，缺失的阶段按无数据处理
    pub async fn competitor_report(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<AuditCompetitorsResponse, AuditUseCaseError> {
        let audit = self.get_audit(user_id, id).await?;
        Ok(AuditCompetitorsResponse {
            audit_id: audit.id,
            comparison: audit_report::competitor_comparison(&audit.domain, &audit.step_results),
            backlink_gap: audit_report::backlink_gap(&audit.step_results),
            domain: audit.domain,
        })
    }
}

#[cfg(test)]
#[path = "audit_use_case_test.rs"]
mod tests;
