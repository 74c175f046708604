// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 创建全站扫描请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateScanRequestDto {
    #[validate(length(min = 1, max = 253))]
    pub domain: String,

    /// 最大抓取页面数，缺省使用配置值
    #[validate(range(min = 1, max = 10000))]
    pub max_pages: Option<u32>,

    #[serde(default)]
    pub enable_javascript: bool,

    #[serde(default)]
    pub store_raw_html: bool,

    #[serde(default)]
    pub calculate_keyword_density: bool,

    /// 起始URL，必须属于目标域名
    #[validate(url)]
    pub start_url: Option<String>,

    pub audit_id: Option<Uuid>,

    pub domain_entity_id: Option<Uuid>,
}
