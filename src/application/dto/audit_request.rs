// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建审计请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAuditRequestDto {
    /// 目标域名，允许携带协议和路径，创建时会被规范化
    #[validate(length(min = 1, max = 253))]
    pub domain: String,

    /// 目标关键词，为空时按域名和城市自动生成
    #[serde(default)]
    #[validate(length(max = 20))]
    pub keywords: Vec<String>,

    /// 竞争对手域名，为空时由排名服务发现
    #[serde(default)]
    #[validate(length(max = 5))]
    pub competitors: Vec<String>,

    #[validate(length(max = 100))]
    pub city: Option<String>,

    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[validate(length(max = 200))]
    pub business_name: Option<String>,

    #[validate(length(max = 200))]
    pub business_location: Option<String>,

    pub place_id: Option<String>,

    /// 跳过上游缓存，同时绕过重复提交冷却
    #[serde(default)]
    pub skip_cache: bool,
}

/// 分页查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ListQueryDto {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,

    pub offset: Option<u64>,
}

impl ListQueryDto {
    pub const DEFAULT_LIMIT: u64 = 20;

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}
