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
            audit_request::ListQueryDto, report_response::ListResponse,
            scan_request::CreateScanRequestDto,
        },
        use_cases::scan_use_case::ScanUseCase,
    },
    config::settings::ScanSettings,
    domain::{
        repositories::scan_repository::ScanRepository, services::thematic_scorer::ThematicScorer,
    },
    presentation::{errors::AppError, extractors::user_id::UserId},
    queue::job_queue::JobQueue,
};

/// 创建全站扫描
pub async fn create_scan<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Json(payload): Json<CreateScanRequestDto>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    let scan = ScanUseCase::new(scan_repo, queue, settings, scorer)
        .create_scan(user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(scan)))
}

pub async fn list_scans<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    let items = ScanUseCase::new(scan_repo, queue, settings, scorer)
        .list_scans(user_id, &query)
        .await?;
    Ok(Json(ListResponse {
        items,
        limit: query.limit(),
        offset: query.offset(),
    }))
}

/// 扫描详情，包含摘要和主题评分
pub async fn get_scan<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    let detail = ScanUseCase::new(scan_repo, queue, settings, scorer)
        .get_scan(user_id, id)
        .await?;
    Ok(Json(detail))
}

pub async fn list_scan_pages<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    let pages = ScanUseCase::new(scan_repo, queue, settings, scorer)
        .list_pages(user_id, id, &query)
        .await?;
    Ok(Json(pages))
}

/// 单页问题分级
pub async fn get_page_issues<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Path((id, page_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    let issues = ScanUseCase::new(scan_repo, queue, settings, scorer)
        .page_issues(user_id, id, page_id)
        .await?;
    Ok(Json(issues))
}

pub async fn delete_scan<SR, Q>(
    Extension(scan_repo): Extension<Arc<SR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<ScanSettings>,
    Extension(scorer): Extension<ThematicScorer>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    SR: ScanRepository + 'static,
    Q: JobQueue + 'static,
{
    ScanUseCase::new(scan_repo, queue, settings, scorer)
        .delete_scan(user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
