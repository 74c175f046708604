// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 外部数据服务接口
//!
//! 抓取、排名和地点数据服务都是外部协作者，这里只定义
//! 执行器依赖的契约，具体实现位于 `engines` 模块。

use crate::domain::models::audit::{BacklinksSummary, BusinessProfile, KeywordPosition};
use crate::domain::models::geo_grid::CompetitorSample;
use crate::domain::models::scan::{CrawlConfig, CrawledPage, ScanSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 外部服务错误类型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),
    /// 上游服务返回的错误，消息原样保留
    #[error("{0}")]
    Upstream(String),
    /// 响应无法解析
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
    /// 超时
    #[error("Provider request timed out")]
    Timeout,
    /// 被上游限流
    #[error("Provider rate limit exceeded")]
    RateLimited,
}

impl ProviderError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::Timeout | ProviderError::RateLimited
        )
    }
}

/// 远程抓取任务状态
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrawlTaskStatus {
    /// 抓取本身是否已经结束
    pub finished: bool,
    pub pages_crawled: u32,
    pub pages_in_queue: u32,
}

/// 一批页面结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageBatch {
    pub pages: Vec<CrawledPage>,
    /// 远程任务的页面总数
    pub total_count: u64,
}

/// 抓取服务返回的最终摘要
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrawlSummaryRecord {
    pub total_pages: i32,
    pub crawled_pages: i32,
    pub crawl_stop_reason: Option<String>,
    #[serde(default)]
    pub errors_count: i32,
    #[serde(default)]
    pub warnings_count: i32,
    #[serde(default)]
    pub notices_count: i32,
    pub avg_lcp: Option<f64>,
    pub avg_cls: Option<f64>,
    #[serde(default)]
    pub images_count: i32,
    #[serde(default)]
    pub internal_links_count: i32,
    #[serde(default)]
    pub external_links_count: i32,
    #[serde(default)]
    pub redirects_count: i32,
    #[serde(default)]
    pub duplicate_titles: i32,
    #[serde(default)]
    pub duplicate_descriptions: i32,
    #[serde(default)]
    pub duplicate_content: i32,
    #[serde(default)]
    pub domain_info: serde_json::Value,
    #[serde(default)]
    pub ssl_info: serde_json::Value,
    /// 本次抓取的费用
    pub cost: Option<f64>,
}

impl CrawlSummaryRecord {
    /// 转换为属于指定扫描的摘要
    pub fn into_summary(self, scan_id: Uuid) -> ScanSummary {
        ScanSummary {
            scan_id,
            total_pages: self.total_pages,
            crawled_pages: self.crawled_pages,
            crawl_stop_reason: self.crawl_stop_reason,
            errors_count: self.errors_count,
            warnings_count: self.warnings_count,
            notices_count: self.notices_count,
            avg_lcp: self.avg_lcp,
            avg_cls: self.avg_cls,
            images_count: self.images_count,
            internal_links_count: self.internal_links_count,
            external_links_count: self.external_links_count,
            redirects_count: self.redirects_count,
            duplicate_titles: self.duplicate_titles,
            duplicate_descriptions: self.duplicate_descriptions,
            duplicate_content: self.duplicate_content,
            domain_info: self.domain_info,
            ssl_info: self.ssl_info,
        }
    }
}

/// 抓取服务特质
#[async_trait]
pub trait CrawlProvider: Send + Sync {
    /// 提交抓取任务，返回远程任务标识
    async fn submit_crawl(&self, target: &str, config: &CrawlConfig) -> Result<String, ProviderError>;

    /// 查询远程抓取任务状态
    async fn crawl_status(&self, task_id: &str) -> Result<CrawlTaskStatus, ProviderError>;

    /// 分页拉取页面结果
    async fn fetch_pages(&self, task_id: &str, offset: u32, limit: u32) -> Result<PageBatch, ProviderError>;

    /// 拉取最终摘要
    async fn fetch_summary(&self, task_id: &str) -> Result<CrawlSummaryRecord, ProviderError>;

    /// 即时分析单个页面
    async fn instant_page(&self, url: &str, use_cache: bool) -> Result<CrawledPage, ProviderError>;
}

/// 关键词排名查询
#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub domain: String,
    pub keywords: Vec<String>,
    pub location: Option<String>,
    /// 为 false 时上游必须重新计算
    pub use_cache: bool,
}

/// 排名/关键词服务特质
#[async_trait]
pub trait RankProvider: Send + Sync {
    /// 查询域名在各关键词下的排名
    async fn keyword_rankings(&self, query: &RankQuery) -> Result<Vec<KeywordPosition>, ProviderError>;

    /// 查询外链概要
    async fn backlinks_summary(&self, domain: &str, use_cache: bool) -> Result<BacklinksSummary, ProviderError>;

    /// 发现竞争对手域名
    async fn competitor_domains(
        &self,
        domain: &str,
        location: Option<String>,
        limit: u32,
    ) -> Result<Vec<String>, ProviderError>;
}

/// 地点/目录服务特质
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// 按名称和位置查找商家资料
    async fn find_business(
        &self,
        name: &str,
        location: Option<String>,
    ) -> Result<Option<BusinessProfile>, ProviderError>;

    /// 查询某个坐标上某个关键词的本地排名结果
    async fn local_rankings(&self, keyword: &str, lat: f64, lng: f64) -> Result<Vec<CompetitorSample>, ProviderError>;
}
