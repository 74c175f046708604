// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{decode, encode, map_update_err, parse_status, to_db_time, to_utc};
use crate::domain::models::geo_grid::{GeoGridScan, GeoGridStatus, GridPoint};
use crate::domain::repositories::geo_grid_repository::GeoGridRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    geo_grid_point as point_entity, geo_grid_scan as scan_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 地理网格仓库实现
#[derive(Clone)]
pub struct GeoGridRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl GeoGridRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<scan_entity::Model> for GeoGridScan {
    type Error = RepositoryError;

    fn try_from(model: scan_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            campaign_id: model.campaign_id,
            business_name: model.business_name,
            place_id: model.place_id,
            center_lat: model.center_lat,
            center_lng: model.center_lng,
            grid_size: model.grid_size,
            radius_km: model.radius_km,
            keywords: decode(model.keywords, "keywords")?,
            status: parse_status(&model.status, "geo grid")?,
            progress: model.progress,
            error_message: model.error_message,
            created_at: to_utc(model.created_at),
            updated_at: to_utc(model.updated_at),
            started_at: model.started_at.map(to_utc),
            completed_at: model.completed_at.map(to_utc),
        })
    }
}

fn scan_active_model(scan: &GeoGridScan) -> Result<scan_entity::ActiveModel, RepositoryError> {
    Ok(scan_entity::ActiveModel {
        id: Set(scan.id),
        user_id: Set(scan.user_id),
        campaign_id: Set(scan.campaign_id),
        business_name: Set(scan.business_name.clone()),
        place_id: Set(scan.place_id.clone()),
        center_lat: Set(scan.center_lat),
        center_lng: Set(scan.center_lng),
        grid_size: Set(scan.grid_size),
        radius_km: Set(scan.radius_km),
        keywords: Set(encode(&scan.keywords, "keywords")?),
        status: Set(scan.status.to_string()),
        progress: Set(scan.progress),
        error_message: Set(scan.error_message.clone()),
        created_at: Set(to_db_time(scan.created_at)),
        updated_at: Set(to_db_time(scan.updated_at)),
        started_at: Set(scan.started_at.map(to_db_time)),
        completed_at: Set(scan.completed_at.map(to_db_time)),
    })
}

impl TryFrom<point_entity::Model> for GridPoint {
    type Error = RepositoryError;

    fn try_from(model: point_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            scan_id: model.scan_id,
            row: model.row_index,
            col: model.col_index,
            lat: model.lat,
            lng: model.lng,
            rankings: decode(model.rankings, "rankings")?,
            sampled_at: to_utc(model.sampled_at),
        })
    }
}

fn collect_scans(models: Vec<scan_entity::Model>) -> Result<Vec<GeoGridScan>, RepositoryError> {
    models.into_iter().map(GeoGridScan::try_from).collect()
}

#[async_trait]
impl GeoGridRepository for GeoGridRepositoryImpl {
    async fn create(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError> {
        scan_active_model(scan)?.insert(self.db.as_ref()).await?;
        Ok(scan.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GeoGridScan>, RepositoryError> {
        scan_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(GeoGridScan::try_from)
            .transpose()
    }

    async fn update(&self, scan: &GeoGridScan) -> Result<GeoGridScan, RepositoryError> {
        let updated = scan_active_model(scan)?
            .update(self.db.as_ref())
            .await
            .map_err(map_update_err)?;
        updated.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        point_entity::Entity::delete_many()
            .filter(point_entity::Column::ScanId.eq(id))
            .exec(&txn)
            .await?;
        let result = scan_entity::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }
        txn.commit().await?;
        Ok(())
    }

    async fn upsert_point(&self, point: &GridPoint) -> Result<bool, RepositoryError> {
        let model = point_entity::ActiveModel {
            id: Set(point.id),
            scan_id: Set(point.scan_id),
            row_index: Set(point.row),
            col_index: Set(point.col),
            lat: Set(point.lat),
            lng: Set(point.lng),
            rankings: Set(encode(&point.rankings, "rankings")?),
            sampled_at: Set(to_db_time(point.sampled_at)),
        };

        let result = point_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    point_entity::Column::ScanId,
                    point_entity::Column::RowIndex,
                    point_entity::Column::ColIndex,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(inserted) => Ok(inserted > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_points(&self, scan_id: Uuid) -> Result<Vec<GridPoint>, RepositoryError> {
        point_entity::Entity::find()
            .filter(point_entity::Column::ScanId.eq(scan_id))
            .order_by_asc(point_entity::Column::RowIndex)
            .order_by_asc(point_entity::Column::ColIndex)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(GridPoint::try_from)
            .collect()
    }

    async fn latest_completed(
        &self,
        user_id: Uuid,
        campaign_id: Uuid,
        limit: u64,
    ) -> Result<Vec<GeoGridScan>, RepositoryError> {
        let models = scan_entity::Entity::find()
            .filter(scan_entity::Column::UserId.eq(user_id))
            .filter(scan_entity::Column::CampaignId.eq(campaign_id))
            .filter(scan_entity::Column::Status.eq(GeoGridStatus::Completed.to_string()))
            .order_by_desc(scan_entity::Column::CompletedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        collect_scans(models)
    }

    async fn find_stale(&self, updated_before: DateTime<Utc>) -> Result<Vec<GeoGridScan>, RepositoryError> {
        let models = scan_entity::Entity::find()
            .filter(scan_entity::Column::Status.is_in([
                GeoGridStatus::Pending.to_string(),
                GeoGridStatus::Scanning.to_string(),
            ]))
            .filter(scan_entity::Column::UpdatedAt.lt(to_db_time(updated_before)))
            .all(self.db.as_ref())
            .await?;
        collect_scans(models)
    }
}
