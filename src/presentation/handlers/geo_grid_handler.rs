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
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::geo_grid_request::CreateGeoGridRequestDto,
        use_cases::geo_grid_use_case::GeoGridUseCase,
    },
    config::settings::GeoGridSettings,
    domain::repositories::geo_grid_repository::GeoGridRepository,
    presentation::{errors::AppError, extractors::user_id::UserId},
    queue::job_queue::JobQueue,
};

/// 创建地理网格扫描
pub async fn create_geo_grid_scan<GR, Q>(
    Extension(grid_repo): Extension<Arc<GR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<GeoGridSettings>,
    UserId(user_id): UserId,
    Json(payload): Json<CreateGeoGridRequestDto>,
) -> Result<impl IntoResponse, AppError>
where
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    let scan = GeoGridUseCase::new(grid_repo, queue, settings)
        .create_scan(user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(scan)))
}

/// 扫描详情与全部采样点
pub async fn get_geo_grid_scan<GR, Q>(
    Extension(grid_repo): Extension<Arc<GR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<GeoGridSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    let detail = GeoGridUseCase::new(grid_repo, queue, settings)
        .get_scan(user_id, id)
        .await?;
    Ok(Json(detail))
}

/// 活动的竞争对手汇总
pub async fn get_campaign_competitors<GR, Q>(
    Extension(grid_repo): Extension<Arc<GR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<GeoGridSettings>,
    UserId(user_id): UserId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    let response = GeoGridUseCase::new(grid_repo, queue, settings)
        .campaign_competitors(user_id, campaign_id)
        .await?;
    Ok(Json(response))
}

pub async fn delete_geo_grid_scan<GR, Q>(
    Extension(grid_repo): Extension<Arc<GR>>,
    Extension(queue): Extension<Arc<Q>>,
    Extension(settings): Extension<GeoGridSettings>,
    UserId(user_id): UserId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    GeoGridUseCase::new(grid_repo, queue, settings)
        .delete_scan(user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
