// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::geo_grid::{CompetitorAggregate, GeoGridScan, GridPoint};
use crate::domain::models::scan::{ScanPage, ScanSummary, SiteAuditScan};
use crate::domain::models::score::ThematicReport;
use crate::domain::services::audit_report::{BacklinkGap, ComparisonRow};
use crate::domain::services::issue_classifier::IssueBuckets;
use serde::Serialize;
use uuid::Uuid;

/// 分页列表响应
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub limit: u64,
    pub offset: u64,
}

/// 审计竞争对手报告
#[derive(Debug, Serialize)]
pub struct AuditCompetitorsResponse {
    pub audit_id: Uuid,
    pub domain: String,
    pub comparison: Vec<ComparisonRow>,
    pub backlink_gap: Vec<BacklinkGap>,
}

/// 扫描详情响应
///
/// `summary` 存在即表示扫描结果已经落库
#[derive(Debug, Serialize)]
pub struct ScanDetailResponse {
    #[serde(flatten)]
    pub scan: SiteAuditScan,
    pub summary: Option<ScanSummary>,
    /// 代表页面的主题评分
    pub report: Option<ThematicReport>,
    pub pages_count: u64,
}

/// 扫描页面列表响应
#[derive(Debug, Serialize)]
pub struct ScanPagesResponse {
    pub scan_id: Uuid,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub pages: Vec<ScanPage>,
}

/// 单页问题分类响应
#[derive(Debug, Serialize)]
pub struct PageIssuesResponse {
    pub page_id: Uuid,
    pub url: String,
    /// 抓取服务约定下的问题类型
    pub issue_types: Vec<String>,
    #[serde(flatten)]
    pub buckets: IssueBuckets,
}

/// 地理网格扫描详情响应
#[derive(Debug, Serialize)]
pub struct GeoGridDetailResponse {
    #[serde(flatten)]
    pub scan: GeoGridScan,
    pub points: Vec<GridPoint>,
}

/// 活动竞争对手汇总响应
#[derive(Debug, Serialize)]
pub struct CampaignCompetitorsResponse {
    pub campaign_id: Uuid,
    /// 最近一次完成的扫描，没有时为空
    pub scan_id: Option<Uuid>,
    pub previous_scan_id: Option<Uuid>,
    pub competitors: Vec<CompetitorAggregate>,
}
