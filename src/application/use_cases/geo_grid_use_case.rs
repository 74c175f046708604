// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::{
    application::dto::{
        geo_grid_request::CreateGeoGridRequestDto,
        report_response::{CampaignCompetitorsResponse, GeoGridDetailResponse},
    },
    config::settings::GeoGridSettings,
    domain::{
        models::{geo_grid::GeoGridScan, job::Job},
        repositories::{geo_grid_repository::GeoGridRepository, job_repository::RepositoryError},
        services::{
            geo_grid_aggregator::{aggregate_with_history, TargetBusiness},
            keyword_planner::normalize_keywords,
        },
    },
    queue::job_queue::{JobQueue, QueueError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

/// 单次网格扫描最多跟踪的关键词数
const MAX_GRID_KEYWORDS: usize = 10;

#[derive(Error, Debug)]
pub enum GeoGridUseCaseError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Geo-grid scan not found")]
    NotFound,
    #[error("Geo-grid scan belongs to another user")]
    Forbidden,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

pub struct GeoGridUseCase<GR, Q> {
    grid_repo: Arc<GR>,
    queue: Arc<Q>,
    settings: GeoGridSettings,
}

impl<GR, Q> GeoGridUseCase<GR, Q>
where
    GR: GeoGridRepository + 'static,
    Q: JobQueue + 'static,
{
    pub fn new(grid_repo: Arc<GR>, queue: Arc<Q>, settings: GeoGridSettings) -> Self {
        Self {
            grid_repo,
            queue,
            settings,
        }
    }

    pub async fn create_scan(
        &self,
        user_id: Uuid,
        dto: CreateGeoGridRequestDto,
    ) -> Result<GeoGridScan, GeoGridUseCaseError> {
        dto.validate()
            .map_err(|e| GeoGridUseCaseError::Validation(e.to_string()))?;
        if dto.grid_size % 2 == 0 || dto.grid_size > self.settings.max_grid_size {
            return Err(GeoGridUseCaseError::Validation(format!(
                "grid_size must be an odd number between 3 and {}",
                self.settings.max_grid_size
            )));
        }
        let keywords = normalize_keywords(&dto.keywords, MAX_GRID_KEYWORDS);
        if keywords.is_empty() {
            return Err(GeoGridUseCaseError::Validation(
                "at least one non-empty keyword is required".to_string(),
            ));
        }

        let scan = GeoGridScan::new(
            user_id,
            dto.campaign_id,
            dto.business_name.trim().to_string(),
            dto.place_id,
            dto.center_lat,
            dto.center_lng,
            dto.grid_size,
            dto.radius_km.unwrap_or(self.settings.default_radius_km),
            keywords,
        );
        let scan = self.grid_repo.create(&scan).await?;
        if let Err(e) = self.queue.enqueue(Job::geo_grid(scan.id)).await {
            if let Err(cleanup) = self.grid_repo.delete(scan.id).await {
                error!("Failed to remove geo-grid scan {} after enqueue error: {}", scan.id, cleanup);
            }
            return Err(e.into());
        }

        info!(
            "Geo-grid scan {} created ({}x{}, {} keywords)",
            scan.id,
            scan.grid_size,
            scan.grid_size,
            scan.keywords.len()
        );
        Ok(scan)
    }

    async fn owned_scan(&self, user_id: Uuid, id: Uuid) -> Result<GeoGridScan, GeoGridUseCaseError> {
        let scan = self
            .grid_repo
            .find_by_id(id)
            .await?
            .ok_or(GeoGridUseCaseError::NotFound)?;
        if scan.user_id != user_id {
            return Err(GeoGridUseCaseError::Forbidden);
        }
        Ok(scan)
    }

    pub async fn get_scan(&self, user_id: Uuid, id: Uuid) -> Result<GeoGridDetailResponse, GeoGridUseCaseError> {
        let scan = self.owned_scan(user_id, id).await?;
        let points = self.grid_repo.list_points(id).await?;
        Ok(GeoGridDetailResponse { scan, points })
    }

    /// 活动最近一次完成扫描的竞争对手汇总，并与上一次完成的扫描比较
    ///
    /// 只统计调用者自己的扫描，其他用户使用相同活动ID的扫描不可见。
    pub async fn campaign_competitors(
        &self,
        user_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<CampaignCompetitorsResponse, GeoGridUseCaseError> {
        let scans = self.grid_repo.latest_completed(user_id, campaign_id, 2).await?;
        let Some(latest) = scans.first() else {
            return Ok(CampaignCompetitorsResponse {
                campaign_id,
                scan_id: None,
                previous_scan_id: None,
                competitors: Vec::new(),
            });
        };

        let current = self.grid_repo.list_points(latest.id).await?;
        let previous_scan = scans.get(1);
        let previous = match previous_scan {
            Some(scan) => Some(self.grid_repo.list_points(scan.id).await?),
            None => None,
        };

        let target = TargetBusiness {
            place_id: latest.place_id.as_deref(),
            name: &latest.business_name,
        };
        let competitors = aggregate_with_history(&current, previous.as_deref(), &target);

        Ok(CampaignCompetitorsResponse {
            campaign_id,
            scan_id: Some(latest.id),
            previous_scan_id: previous_scan.map(|s| s.id),
            competitors,
        })
    }

    pub async fn delete_scan(&self, user_id: Uuid, id: Uuid) -> Result<(), GeoGridUseCaseError> {
        self.owned_scan(user_id, id).await?;
        self.grid_repo.delete(id).await?;
        info!("Geo-grid scan {} deleted", id);
        Ok(())
    }
}
