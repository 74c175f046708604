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

use super::{parse_status, to_db_time, to_utc};
use crate::domain::models::job::{Job, JobStatus, JobType};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::infrastructure::database::entities::job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 任务消息仓库实现
///
/// 基于SeaORM实现，取任务时使用 `FOR UPDATE SKIP LOCKED`
#[derive(Clone)]
pub struct JobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for Job {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            job_type: parse_status::<JobType>(&model.job_type, "job type")?,
            status: parse_status(&model.status, "job")?,
            payload: model.payload,
            attempt_count: model.attempt_count,
            max_retries: model.max_retries,
            scheduled_at: model.scheduled_at.map(to_utc),
            created_at: to_utc(model.created_at),
            updated_at: to_utc(model.updated_at),
            started_at: model.started_at.map(to_utc),
            completed_at: model.completed_at.map(to_utc),
            lock_token: model.lock_token,
            lock_expires_at: model.lock_expires_at.map(to_utc),
        })
    }
}

impl From<&Job> for job_entity::ActiveModel {
    fn from(job: &Job) -> Self {
        Self {
            id: Set(job.id),
            job_type: Set(job.job_type.to_string()),
            status: Set(job.status.to_string()),
            payload: Set(job.payload.clone()),
            attempt_count: Set(job.attempt_count),
            max_retries: Set(job.max_retries),
            scheduled_at: Set(job.scheduled_at.map(to_db_time)),
            started_at: Set(job.started_at.map(to_db_time)),
            completed_at: Set(job.completed_at.map(to_db_time)),
            lock_token: Set(job.lock_token),
            lock_expires_at: Set(job.lock_expires_at.map(to_db_time)),
            created_at: Set(to_db_time(job.created_at)),
            updated_at: Set(to_db_time(job.updated_at)),
        }
    }
}

impl JobRepositoryImpl {
    async fn finish(&self, id: Uuid, status: JobStatus) -> Result<(), RepositoryError> {
        let now = to_db_time(Utc::now());
        let result = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(status.to_string()))
            .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(now)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::LockExpiresAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn acquire_next(
        &self,
        worker_id: Uuid,
        lease: chrono::Duration,
    ) -> Result<Option<Job>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let job = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .filter(
                Condition::any()
                    .add(job_entity::Column::ScheduledAt.is_null())
                    .add(job_entity::Column::ScheduledAt.lte(to_db_time(now))),
            )
            .order_by_asc(job_entity::Column::CreatedAt)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let Some(job) = job else {
            txn.commit().await?;
            return Ok(None);
        };

        let attempts = job.attempt_count + 1;
        let mut active: job_entity::ActiveModel = job.into();
        active.status = Set(JobStatus::Active.to_string());
        active.lock_token = Set(Some(worker_id));
        active.lock_expires_at = Set(Some(to_db_time(now + lease)));
        active.started_at = Set(Some(to_db_time(now)));
        active.updated_at = Set(to_db_time(now));
        active.attempt_count = Set(attempts);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        updated.try_into().map(Some)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.finish(id, JobStatus::Completed).await
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.finish(id, JobStatus::Failed).await
    }

    async fn requeue(&self, id: Uuid, run_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Queued.to_string()),
            )
            .col_expr(
                job_entity::Column::ScheduledAt,
                Expr::value(Some(to_db_time(run_at))),
            )
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(to_db_time(Utc::now())))
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::LockExpiresAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn reset_stuck_jobs(&self) -> Result<u64, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Queued.to_string()),
            )
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::LockExpiresAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .filter(job_entity::Column::Status.eq(JobStatus::Active.to_string()))
            .filter(job_entity::Column::LockExpiresAt.lte(to_db_time(Utc::now())))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}
