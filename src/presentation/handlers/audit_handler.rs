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

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::{
            audit_request::{CreateAuditRequestDto, ListQueryDto},
            report_response::ListResponse,
        },
        use_cases::audit_use_case::AuditUseCase,
    },
    config::settings::AuditSettings,
    domain::repositories::audit_repository::AuditRepository,
    presentation::{errors::AppError, extractors::user_id::UserId},
    queue::job_queue::JobQueue,
};

fn use_case<AR, Q>(repo: Arc<AR>, queue: Arc<Q>, settings: AuditSettings) -> AuditUseCase<AR, Q>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    AuditUseCase::new(repo, queue, settings)
}

/// 创建审计
pub async fn create_audit<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Json(payload): Json<CreateAuditRequestDto>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    let audit = use_case(audit_repo, queue, settings)
        .create_audit(user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(audit)))
}

/// 列出当前用户的审计，按创建时间倒序
pub async fn list_audits<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    let items = use_case(audit_repo, queue, settings)
        .list_audits(user_id, &query)
        .await?;
    Ok(Json(ListResponse {
        items,
        limit: query.limit(),
        offset: query.offset(),
    }))
}

pub async fn get_audit<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    let audit = use_case(audit_repo, queue, settings)
        .get_audit(user_id, id)
        .await?;
    Ok(Json(audit))
}

/// 重试失败的审计
pub async fn retry_audit<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    let audit = use_case(audit_repo, queue, settings)
        .retry_audit(user_id, id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(audit)))
}

pub async fn delete_audit<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    use_case(audit_repo, queue, settings)
        .delete_audit(user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 竞争对手对比与外链差距
pub async fn get_audit_competitors<AR, Q>(
    Extension(audit_repo): Extension<Arc<AR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<AuditSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    AR: AuditRepository + 'static,
    Q: JobQueue + 'static,
{
    let report = use_case(audit_repo, queue, settings)
        .competitor_report(user_id, id)
        .await?;
    Ok(Json(report))
}
