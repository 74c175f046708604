// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{decode, encode, map_update_err, parse_status, to_db_time, to_utc};
use crate::domain::models::audit::{Audit, AuditStatus};
use crate::domain::repositories::audit_repository::AuditRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::audit as audit_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 审计仓库实现
///
/// 基于SeaORM实现的审计数据访问层
#[derive(Clone)]
pub struct AuditRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AuditRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

const ACTIVE_STATUSES: [AuditStatus; 3] = [
    AuditStatus::Pending,
    AuditStatus::Crawling,
    AuditStatus::Analyzing,
];

impl TryFrom<audit_entity::Model> for Audit {
    type Error = RepositoryError;

    fn try_from(model: audit_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            domain: model.domain,
            status: parse_status(&model.status, "audit")?,
            progress: model.progress,
            current_step: model.current_step,
            error_message: model.error_message,
            city: model.city,
            state: model.state,
            business_name: model.business_name,
            business_location: model.business_location,
            place_id: model.place_id,
            keywords: decode(model.keywords, "keywords")?,
            competitors: decode(model.competitors, "competitors")?,
            step_results: decode(model.step_results, "step_results")?,
            score: model.score,
            created_at: to_utc(model.created_at),
            updated_at: to_utc(model.updated_at),
            started_at: model.started_at.map(to_utc),
            completed_at: model.completed_at.map(to_utc),
        })
    }
}

fn to_active_model(audit: &Audit) -> Result<audit_entity::ActiveModel, RepositoryError> {
    Ok(audit_entity::ActiveModel {
        id: Set(audit.id),
        user_id: Set(audit.user_id),
        domain: Set(audit.domain.clone()),
        status: Set(audit.status.to_string()),
        progress: Set(audit.progress),
        current_step: Set(audit.current_step.clone()),
        error_message: Set(audit.error_message.clone()),
        city: Set(audit.city.clone()),
        state: Set(audit.state.clone()),
        business_name: Set(audit.business_name.clone()),
        business_location: Set(audit.business_location.clone()),
        place_id: Set(audit.place_id.clone()),
        keywords: Set(encode(&audit.keywords, "keywords")?),
        competitors: Set(encode(&audit.competitors, "competitors")?),
        step_results: Set(encode(&audit.step_results, "step_results")?),
        score: Set(audit.score),
        created_at: Set(to_db_time(audit.created_at)),
        updated_at: Set(to_db_time(audit.updated_at)),
        started_at: Set(audit.started_at.map(to_db_time)),
        completed_at: Set(audit.completed_at.map(to_db_time)),
    })
}

fn collect(models: Vec<audit_entity::Model>) -> Result<Vec<Audit>, RepositoryError> {
    models.into_iter().map(Audit::try_from).collect()
}

#[async_trait]
impl AuditRepository for AuditRepositoryImpl {
    async fn create(&self, audit: &Audit) -> Result<Audit, RepositoryError> {
        to_active_model(audit)?.insert(self.db.as_ref()).await?;
        Ok(audit.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Audit>, RepositoryError> {
        audit_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Audit::try_from)
            .transpose()
    }

    async fn update(&self, audit: &Audit) -> Result<Audit, RepositoryError> {
        let updated = to_active_model(audit)?
            .update(self.db.as_ref())
            .await
            .map_err(map_update_err)?;
        updated.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = audit_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Audit>, RepositoryError> {
        let models = audit_entity::Entity::find()
            .filter(audit_entity::Column::UserId.eq(user_id))
            .order_by_desc(audit_entity::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn find_recent_for_domain(
        &self,
        user_id: Uuid,
        domain: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Audit>, RepositoryError> {
        audit_entity::Entity::find()
            .filter(audit_entity::Column::UserId.eq(user_id))
            .filter(audit_entity::Column::Domain.eq(domain))
            .filter(audit_entity::Column::CreatedAt.gte(to_db_time(since)))
            .order_by_desc(audit_entity::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?
            .map(Audit::try_from)
            .transpose()
    }

    async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<Audit>, RepositoryError> {
        let models = audit_entity::Entity::find()
            .filter(
                audit_entity::Column::Status
                    .is_in(ACTIVE_STATUSES.iter().map(|s| s.to_string())),
            )
            .filter(audit_entity::Column::UpdatedAt.lt(to_db_time(updated_before)))
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }
}
