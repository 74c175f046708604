// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{clamp_progress, failure_message, DomainError};

/// 每公里对应的纬度数
const KM_PER_DEGREE_LAT: f64 = 110.574;
/// 赤道处每公里对应的经度数
const KM_PER_DEGREE_LNG: f64 = 111.320;

/// 地理网格扫描实体
///
/// 以商家位置为中心，在 N×N 个采样点上测量本地搜索排名。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoGridScan {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 所属活动，同一活动的多次扫描之间可以比较排名变化
    pub campaign_id: Uuid,
    pub business_name: String,
    pub place_id: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    /// 网格边长（点数）
    pub grid_size: i32,
    /// 网格半径（公里）
    pub radius_km: f64,
    pub keywords: Vec<String>,
    pub status: GeoGridStatus,
    pub progress: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 地理网格扫描状态
///
/// Pending → Scanning → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeoGridStatus {
    #[default]
    Pending,
    Scanning,
    Completed,
    Failed,
}

impl GeoGridStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GeoGridStatus::Completed | GeoGridStatus::Failed)
    }
}

impl fmt::Display for GeoGridStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeoGridStatus::Pending => write!(f, "pending"),
            GeoGridStatus::Scanning => write!(f, "scanning"),
            GeoGridStatus::Completed => write!(f, "completed"),
            GeoGridStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for GeoGridStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GeoGridStatus::Pending),
            "scanning" => Ok(GeoGridStatus::Scanning),
            "completed" => Ok(GeoGridStatus::Completed),
            "failed" => Ok(GeoGridStatus::Failed),
            _ => Err(()),
        }
    }
}

impl GeoGridScan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        campaign_id: Uuid,
        business_name: String,
        place_id: Option<String>,
        center_lat: f64,
        center_lng: f64,
        grid_size: i32,
        radius_km: f64,
        keywords: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            campaign_id,
            business_name,
            place_id,
            center_lat,
            center_lng,
            grid_size,
            radius_km,
            keywords,
            status: GeoGridStatus::Pending,
            progress: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// 网格中的采样点总数
    pub fn total_points(&self) -> usize {
        (self.grid_size.max(0) as usize).pow(2)
    }

    /// Pending → Scanning
    pub fn begin_scan(mut self) -> Result<Self, DomainError> {
        match self.status {
            GeoGridStatus::Pending => {
                let now = Utc::now();
                self.status = GeoGridStatus::Scanning;
                self.started_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "begin scan")),
        }
    }

    /// 根据已采样点数更新进度
    pub fn record_progress(&mut self, sampled: usize, total: usize) {
        if total == 0 {
            return;
        }
        let pct = (sampled as i64 * 100) / total as i64;
        self.progress = self.progress.max(clamp_progress(pct));
        self.updated_at = Utc::now();
    }

    /// Scanning → Completed
    pub fn complete(mut self) -> Result<Self, DomainError> {
        match self.status {
            GeoGridStatus::Scanning => {
                let now = Utc::now();
                self.status = GeoGridStatus::Completed;
                self.progress = 100;
                self.completed_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "complete")),
        }
    }

    /// 任意非终止状态 → Failed
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::transition(self.status, "fail"));
        }
        let now = Utc::now();
        self.status = GeoGridStatus::Failed;
        self.error_message = Some(failure_message(message));
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }
}

/// 某个采样点上观察到的竞争对手
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSample {
    /// 竞争对手标识（place id）
    pub place_id: String,
    pub name: String,
    /// 排名（从1开始）
    pub rank: u32,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
}

/// 某个采样点上单个关键词的排名数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRanking {
    pub keyword: String,
    /// 目标商家排名，None 表示未出现在结果中
    pub target_rank: Option<u32>,
    pub competitors: Vec<CompetitorSample>,
}

/// 网格采样点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub row: i32,
    pub col: i32,
    pub lat: f64,
    pub lng: f64,
    pub rankings: Vec<KeywordRanking>,
    pub sampled_at: DateTime<Utc>,
}

/// 网格坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoordinate {
    pub row: i32,
    pub col: i32,
    pub lat: f64,
    pub lng: f64,
}

/// 生成以中心点为中心的 N×N 网格
///
/// 采样点在边长为 2×radius 的正方形内等距分布，
/// 网格大小为 1 时只返回中心点。
pub fn generate_grid(center_lat: f64, center_lng: f64, size: i32, radius_km: f64) -> Vec<GridCoordinate> {
    if size <= 0 {
        return Vec::new();
    }
    let half = (size - 1) as f64 / 2.0;
    let step_km = if size > 1 {
        (2.0 * radius_km) / (size - 1) as f64
    } else {
        0.0
    };
    let lng_scale = KM_PER_DEGREE_LNG * center_lat.to_radians().cos().abs().max(1e-6);

    let mut points = Vec::with_capacity((size * size) as usize);
    for row in 0..size {
        for col in 0..size {
            // 行号自北向南递增
            let north_km = (half - row as f64) * step_km;
            let east_km = (col as f64 - half) * step_km;
            points.push(GridCoordinate {
                row,
                col,
                lat: center_lat + north_km / KM_PER_DEGREE_LAT,
                lng: center_lng + east_km / lng_scale,
            });
        }
    }
    points
}

/// 单个竞争对手在整个网格上的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAggregate {
    pub place_id: String,
    pub name: String,
    /// 是否为目标商家本身
    pub is_target: bool,
    /// 出现次数（采样点×关键词）
    pub appearances: u32,
    /// 仅对出现过的样本求平均
    pub avg_rank: f64,
    pub times_in_top3: u32,
    pub times_in_top10: u32,
    pub times_in_top20: u32,
    /// 加权可见度，占全部可能可见度的百分比
    pub share_of_voice: f64,
    /// 与上一次完成扫描相比的平均排名变化，正数表示排名上升
    pub rank_change: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan() -> GeoGridScan {
        GeoGridScan::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Example Dental".to_string(),
            Some("place-1".to_string()),
            40.0,
            -74.0,
            3,
            1.0,
            vec!["dentist".to_string()],
        )
    }

    #[test]
    fn test_generate_grid_shape() {
        let points = generate_grid(40.0, -74.0, 5, 2.0);
        assert_eq!(points.len(), 25);

        let center = points.iter().find(|p| p.row == 2 && p.col == 2).unwrap();
        assert!((center.lat - 40.0).abs() < 1e-9);
        assert!((center.lng + 74.0).abs() < 1e-9);

        let north_west = points.iter().find(|p| p.row == 0 && p.col == 0).unwrap();
        assert!(north_west.lat > 40.0);
        assert!(north_west.lng < -74.0);
        assert!((north_west.lat - 40.0 - 2.0 / KM_PER_DEGREE_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_generate_grid_single_point() {
        let points = generate_grid(10.0, 20.0, 1, 5.0);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lat, 10.0);
        assert_eq!(points[0].lng, 20.0);
    }

    #[test]
    fn test_geo_grid_lifecycle() {
        let scan = scan().begin_scan().unwrap();
        assert_eq!(scan.status, GeoGridStatus::Scanning);
        let mut scan = scan;
        scan.record_progress(3, 9);
        assert_eq!(scan.progress, 33);
        let scan = scan.complete().unwrap();
        assert_eq!(scan.progress, 100);
        assert!(scan.fail("late").is_err());
    }

    #[test]
    fn test_geo_grid_cannot_complete_from_pending() {
        assert!(scan().complete().is_err());
    }
}
