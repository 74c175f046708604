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

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::geo_grid::{
    generate_grid, CompetitorSample, GeoGridScan, GeoGridStatus, GridPoint, KeywordRanking,
};
use crate::domain::models::job::{GeoGridJobPayload, Job};
use crate::domain::providers::PlacesProvider;
use crate::domain::repositories::geo_grid_repository::GeoGridRepository;
use crate::domain::services::geo_grid_aggregator::TargetBusiness;
use crate::infrastructure::metrics::GEO_GRID_POINTS_SAMPLED;
use crate::utils::errors::WorkerError;
use crate::workers::worker::JobHandler;

/// 把一个采样点上的本地搜索结果转换为关键词排名
///
/// 有 place id 时按 place id 识别目标商家，否则按名称（忽略大小写）识别，
/// 按名称识别出的目标不再作为竞争对手出现。
pub fn keyword_ranking(
    keyword: &str,
    results: Vec<CompetitorSample>,
    target: &TargetBusiness<'_>,
) -> KeywordRanking {
    let is_target = |sample: &CompetitorSample| match target.place_id {
        Some(id) => sample.place_id == id,
        None => sample.name.trim().eq_ignore_ascii_case(target.name.trim()),
    };
    let target_rank = results.iter().find(|s| is_target(s)).map(|s| s.rank);
    let competitors = match target.place_id {
        Some(_) => results,
        None => results.into_iter().filter(|s| !is_target(s)).collect(),
    };
    KeywordRanking {
        keyword: keyword.to_string(),
        target_rank,
        competitors,
    }
}

/// 地理网格执行器
pub struct GeoGridExecutor<GR, PP> {
    grid_repo: Arc<GR>,
    places: Arc<PP>,
}

impl<GR, PP> GeoGridExecutor<GR, PP>
where
    GR: GeoGridRepository,
    PP: PlacesProvider,
{
    pub fn new(grid_repo: Arc<GR>, places: Arc<PP>) -> Self {
        Self { grid_repo, places }
    }

    #[instrument(skip(self, scan), fields(scan_id = %scan.id, grid_size = scan.grid_size))]
    async fn run(&self, scan: GeoGridScan) -> Result<(), WorkerError> {
        let mut scan = match scan.status {
            GeoGridStatus::Pending => self.grid_repo.update(&scan.begin_scan()?).await?,
            _ => scan,
        };

        let coordinates = generate_grid(scan.center_lat, scan.center_lng, scan.grid_size, scan.radius_km);
        let total = scan.total_points();
        let done: HashSet<(i32, i32)> = self
            .grid_repo
            .list_points(scan.id)
            .await?
            .into_iter()
            .map(|p| (p.row, p.col))
            .collect();
        let mut sampled = coordinates
            .iter()
            .filter(|c| done.contains(&(c.row, c.col)))
            .count();

        for coordinate in coordinates {
            if done.contains(&(coordinate.row, coordinate.col)) {
                continue;
            }

            let target = TargetBusiness {
                place_id: scan.place_id.as_deref(),
                name: &scan.business_name,
            };
            let mut rankings = Vec::with_capacity(scan.keywords.len());
            let mut failure = None;
            for keyword in &scan.keywords {
                match self
                    .places
                    .local_rankings(keyword, coordinate.lat, coordinate.lng)
                    .await
                {
                    Ok(results) => rankings.push(keyword_ranking(keyword, results, &target)),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                warn!(
                    "Geo-grid scan {} failed at ({}, {}): {}",
                    scan.id, coordinate.row, coordinate.col, e
                );
                self.grid_repo.update(&scan.fail(e.to_string())?).await?;
                return Ok(());
            }

            let point = GridPoint {
                id: Uuid::new_v4(),
                scan_id: scan.id,
                row: coordinate.row,
                col: coordinate.col,
                lat: coordinate.lat,
                lng: coordinate.lng,
                rankings,
                sampled_at: Utc::now(),
            };
            if self.grid_repo.upsert_point(&point).await? {
                counter!(GEO_GRID_POINTS_SAMPLED).increment(1);
            }

            sampled += 1;
            scan.record_progress(sampled, total);
            scan = self.grid_repo.update(&scan).await?;
        }

        let scan = self.grid_repo.update(&scan.complete()?).await?;
        info!("Geo-grid scan {} completed ({} points)", scan.id, total);
        Ok(())
    }
}

#[async_trait]
impl<GR, PP> JobHandler for GeoGridExecutor<GR, PP>
where
    GR: GeoGridRepository,
    PP: PlacesProvider,
{
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn handle(&self, job: &Job) -> Result<(), WorkerError> {
        let payload: GeoGridJobPayload = job.payload_as()?;
        let Some(scan) = self.grid_repo.find_by_id(payload.scan_id).await? else {
            warn!("Geo-grid scan {} no longer exists, dropping job", payload.scan_id);
            return Ok(());
        };
        if scan.status.is_terminal() {
            info!("Geo-grid scan {} already {}, nothing to do", scan.id, scan.status);
            return Ok(());
        }
        self.run(scan).await
    }

    async fn abandon(&self, job: &Job, reason: &str) -> Result<(), WorkerError> {
        let payload: GeoGridJobPayload = job.payload_as()?;
        if let Some(scan) = self.grid_repo.find_by_id(payload.scan_id).await? {
            if !scan.status.is_terminal() {
                self.grid_repo.update(&scan.fail(reason)?).await?;
            }
        }
        Ok(())
    }
}
