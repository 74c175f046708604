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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{clamp_progress, failure_message, DomainError};

/// 全站扫描实体
///
/// 表示一次完整的网站抓取请求，抓取本身由外部抓取服务执行，
/// 本实体只记录生命周期、远程任务标识和配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteAuditScan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub domain: String,
    pub status: ScanStatus,
    /// 进度（0-100）
    pub progress: i32,
    /// 远程任务标识，在抓取服务接受任务之前为空
    pub task_id: Option<String>,
    pub config: CrawlConfig,
    /// 关联的审计ID
    pub audit_id: Option<Uuid>,
    /// 关联的域名实体ID
    pub domain_entity_id: Option<Uuid>,
    /// 远程调用花费
    pub cost: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 扫描状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Submitting → Crawling → FetchingResults → Completed
/// 任意非终止状态都可以转换为 Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Pending,
    Submitting,
    Crawling,
    FetchingResults,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::Submitting => write!(f, "submitting"),
            ScanStatus::Crawling => write!(f, "crawling"),
            ScanStatus::FetchingResults => write!(f, "fetching_results"),
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScanStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "submitting" => Ok(ScanStatus::Submitting),
            "crawling" => Ok(ScanStatus::Crawling),
            "fetching_results" => Ok(ScanStatus::FetchingResults),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 抓取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// 最大抓取页面数
    pub max_pages: u32,
    /// 是否渲染JavaScript
    #[serde(default)]
    pub enable_javascript: bool,
    /// 是否保留原始HTML
    #[serde(default)]
    pub store_raw_html: bool,
    /// 是否计算关键词密度
    #[serde(default)]
    pub calculate_keyword_density: bool,
    /// 起始URL，缺省时从域名首页开始
    pub start_url: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            enable_javascript: false,
            store_raw_html: false,
            calculate_keyword_density: false,
            start_url: None,
        }
    }
}

impl SiteAuditScan {
    /// 创建一个新的扫描
    pub fn new(user_id: Uuid, domain: String, config: CrawlConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            domain,
            status: ScanStatus::Pending,
            progress: 0,
            task_id: None,
            config,
            audit_id: None,
            domain_entity_id: None,
            cost: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// 扫描的起始URL
    pub fn start_url(&self) -> String {
        self.config
            .start_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/", self.domain))
    }

    /// 提交到抓取服务
    ///
    /// Pending → Submitting，记录开始时间
    pub fn submit(mut self) -> Result<Self, DomainError> {
        match self.status {
            ScanStatus::Pending => {
                let now = Utc::now();
                self.status = ScanStatus::Submitting;
                self.started_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "submit")),
        }
    }

    /// 抓取服务已接受任务
    ///
    /// Submitting → Crawling，持久化远程任务标识
    pub fn accept(mut self, task_id: impl Into<String>) -> Result<Self, DomainError> {
        let task_id = task_id.into();
        if task_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "remote task id cannot be empty".to_string(),
            ));
        }
        match self.status {
            ScanStatus::Submitting => {
                self.status = ScanStatus::Crawling;
                self.task_id = Some(task_id);
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "accept remote task")),
        }
    }

    /// 远程抓取已结束，开始分页拉取结果
    ///
    /// Crawling → FetchingResults
    pub fn begin_fetching(mut self) -> Result<Self, DomainError> {
        match self.status {
            ScanStatus::Crawling => {
                self.status = ScanStatus::FetchingResults;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "fetch results")),
        }
    }

    /// 完成扫描
    ///
    /// FetchingResults → Completed，要求扫描摘要已经持久化
    pub fn complete(mut self, summary_persisted: bool, cost: Option<f64>) -> Result<Self, DomainError> {
        if self.status != ScanStatus::FetchingResults {
            return Err(DomainError::transition(self.status, "complete"));
        }
        if !summary_persisted {
            return Err(DomainError::PreconditionFailed(
                "scan summary must be persisted before completion".to_string(),
            ));
        }
        let now = Utc::now();
        self.status = ScanStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(now);
        self.updated_at = now;
        if cost.is_some() {
            self.cost = cost;
        }
        Ok(self)
    }

    /// 标记扫描失败
    ///
    /// 任意非终止状态 → Failed，不会自动重试
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::transition(self.status, "fail"));
        }
        let now = Utc::now();
        self.status = ScanStatus::Failed;
        self.error_message = Some(failure_message(message));
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }

    /// 设置进度，越界值会被限制在 [0, 100]
    pub fn set_progress(&mut self, progress: i64) {
        self.progress = clamp_progress(progress);
        self.updated_at = Utc::now();
    }

    /// 推进进度，只增不减
    pub fn advance_progress(&mut self, progress: i64) {
        let next = clamp_progress(progress);
        if next > self.progress {
            self.set_progress(next as i64);
        }
    }
}

/// 扫描摘要
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: Uuid,
    pub total_pages: i32,
    pub crawled_pages: i32,
    pub crawl_stop_reason: Option<String>,
    pub errors_count: i32,
    pub warnings_count: i32,
    pub notices_count: i32,
    pub avg_lcp: Option<f64>,
    pub avg_cls: Option<f64>,
    pub images_count: i32,
    pub internal_links_count: i32,
    pub external_links_count: i32,
    pub redirects_count: i32,
    pub duplicate_titles: i32,
    pub duplicate_descriptions: i32,
    pub duplicate_content: i32,
    /// 原始域名信息
    pub domain_info: Value,
    /// 原始SSL信息
    pub ssl_info: Value,
}

impl ScanSummary {
    /// SSL证书是否有效，没有相关信息时返回 None
    pub fn ssl_valid(&self) -> Option<bool> {
        self.ssl_info
            .get("valid_certificate")
            .and_then(Value::as_bool)
    }
}

/// 页面耗时与资源指标
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageTiming {
    /// Largest Contentful Paint（毫秒）
    pub lcp: Option<f64>,
    /// First Input Delay（毫秒）
    pub fid: Option<f64>,
    /// Cumulative Layout Shift
    pub cls: Option<f64>,
    pub time_to_interactive: Option<f64>,
    pub dom_complete: Option<f64>,
    pub waiting_time: Option<f64>,
    pub download_time: Option<f64>,
    /// 页面大小（字节）
    pub page_size: Option<u64>,
}

/// 页面元信息
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub h1: Vec<String>,
    pub word_count: Option<i32>,
    pub internal_links_count: Option<u32>,
    pub external_links_count: Option<u32>,
    pub images_count: Option<u32>,
}

/// 抓取服务返回的单页记录
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub status_code: Option<i32>,
    pub onpage_score: Option<f64>,
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(default)]
    pub timing: PageTiming,
    #[serde(default)]
    pub checks: BTreeMap<String, Value>,
    /// 显式提供的问题数，覆盖按检查项推导的数量
    pub issue_count: Option<i32>,
}

/// 扫描页面
///
/// 在同一扫描内以URL哈希去重。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPage {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub url: String,
    /// URL的SHA-256哈希（十六进制），作为去重键
    pub url_hash: String,
    pub status_code: Option<i32>,
    pub score: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub h1: Vec<String>,
    pub word_count: Option<i32>,
    pub redirect_url: Option<String>,
    pub internal_links: Option<u32>,
    pub external_links: Option<u32>,
    pub timing: PageTiming,
    pub checks: BTreeMap<String, Value>,
    pub issue_types: Vec<String>,
    pub issue_count: i32,
    pub created_at: DateTime<Utc>,
}

impl ScanPage {
    /// 由抓取服务返回的页面记录构建扫描页面
    pub fn from_crawled(scan_id: Uuid, page: CrawledPage) -> Self {
        let issue_types = extract_issue_types(&page.checks);
        let issue_count = page.issue_count.unwrap_or(issue_types.len() as i32);
        Self {
            id: Uuid::new_v4(),
            scan_id,
            url_hash: url_hash(&page.url),
            url: page.url,
            status_code: page.status_code,
            score: page.onpage_score,
            title: page.meta.title,
            description: page.meta.description,
            h1: page.meta.h1,
            word_count: page.meta.word_count,
            redirect_url: page.redirect_url,
            internal_links: page.meta.internal_links_count,
            external_links: page.meta.external_links_count,
            timing: page.timing,
            checks: page.checks,
            issue_types,
            issue_count,
            created_at: Utc::now(),
        }
    }

    /// 仅保留布尔类型的检查项
    pub fn boolean_checks(&self) -> BTreeMap<String, bool> {
        self.checks
            .iter()
            .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
            .collect()
    }
}

/// 计算URL的稳定标识
pub fn url_hash(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// 提取页面问题类型
///
/// 抓取服务的约定：值恰好为 `false` 的检查项即为该页面的问题。
pub fn extract_issue_types(checks: &BTreeMap<String, Value>) -> Vec<String> {
    checks
        .iter()
        .filter(|(_, v)| matches!(v, Value::Bool(false)))
        .map(|(k, _)| k.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan() -> SiteAuditScan {
        SiteAuditScan::new(Uuid::new_v4(), "example.com".to_string(), CrawlConfig::default())
    }

    #[test]
    fn test_scan_lifecycle_happy_path() {
        let scan = scan().submit().unwrap();
        assert_eq!(scan.status, ScanStatus::Submitting);
        assert!(scan.started_at.is_some());

        let scan = scan.accept("task-42").unwrap();
        assert_eq!(scan.status, ScanStatus::Crawling);
        assert_eq!(scan.task_id.as_deref(), Some("task-42"));

        let scan = scan.begin_fetching().unwrap();
        assert_eq!(scan.status, ScanStatus::FetchingResults);

        let scan = scan.complete(true, Some(0.25)).unwrap();
        assert_eq!(scan.status, ScanStatus::Completed);
        assert_eq!(scan.progress, 100);
        assert_eq!(scan.cost, Some(0.25));
        assert!(scan.completed_at.is_some());
    }

    #[test]
    fn test_pending_cannot_jump_to_completed() {
        assert!(scan().complete(false, None).is_err());
        assert!(scan().complete(true, None).is_err());
    }

    #[test]
    fn test_complete_requires_summary() {
        let scan = scan()
            .submit()
            .unwrap()
            .accept("t")
            .unwrap()
            .begin_fetching()
            .unwrap();
        assert!(matches!(
            scan.complete(false, None),
            Err(DomainError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn test_fail_from_any_non_terminal_state() {
        let pending = scan();
        let submitting = pending.clone().submit().unwrap();
        let crawling = submitting.clone().accept("t").unwrap();
        let fetching = crawling.clone().begin_fetching().unwrap();

        for s in [pending, submitting, crawling, fetching] {
            let failed = s.fail("provider rejected the task").unwrap();
            assert_eq!(failed.status, ScanStatus::Failed);
            assert!(failed.completed_at.is_some());
            assert_eq!(
                failed.error_message.as_deref(),
                Some("provider rejected the task")
            );
        }
    }

    #[test]
    fn test_failed_scan_is_terminal() {
        let failed = scan().fail("boom").unwrap();
        assert!(failed.clone().submit().is_err());
        assert!(failed.fail("again").is_err());
    }

    #[test]
    fn test_accept_rejects_empty_task_id() {
        let scan = scan().submit().unwrap();
        assert!(scan.accept("  ").is_err());
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut scan = scan();
        scan.set_progress(140);
        assert_eq!(scan.progress, 100);
        scan.set_progress(-3);
        assert_eq!(scan.progress, 0);
        scan.advance_progress(40);
        scan.advance_progress(10);
        assert_eq!(scan.progress, 40);
    }

    #[test]
    fn test_issue_types_only_exact_false() {
        let mut checks = BTreeMap::new();
        checks.insert("canonical".to_string(), json!(false));
        checks.insert("is_https".to_string(), json!(true));
        checks.insert("no_title".to_string(), json!(false));
        checks.insert("title_length".to_string(), json!(0));
        checks.insert("seo_friendly_url".to_string(), json!(null));

        let issues = extract_issue_types(&checks);
        assert_eq!(issues, vec!["canonical".to_string(), "no_title".to_string()]);
    }

    #[test]
    fn test_issue_count_defaults_to_derived_list() {
        let mut checks = BTreeMap::new();
        checks.insert("canonical".to_string(), json!(false));
        let page = CrawledPage {
            url: "https://example.com/a".to_string(),
            checks: checks.clone(),
            ..Default::default()
        };
        let derived = ScanPage::from_crawled(Uuid::new_v4(), page);
        assert_eq!(derived.issue_count, 1);

        let page = CrawledPage {
            url: "https://example.com/a".to_string(),
            checks,
            issue_count: Some(7),
            ..Default::default()
        };
        let overridden = ScanPage::from_crawled(Uuid::new_v4(), page);
        assert_eq!(overridden.issue_count, 7);
        assert_eq!(derived.url_hash, overridden.url_hash);
    }
}
