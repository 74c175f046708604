// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 创建地理网格扫描请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateGeoGridRequestDto {
    /// 所属活动，同一活动的扫描之间比较排名变化
    pub campaign_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub business_name: String,

    pub place_id: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub center_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub center_lng: f64,

    /// 网格边长，必须为奇数
    #[validate(range(min = 3, max = 15))]
    pub grid_size: i32,

    #[validate(range(min = 0.1, max = 50.0))]
    pub radius_km: Option<f64>,

    #[validate(length(min = 1, max = 10))]
    pub keywords: Vec<String>,
}
