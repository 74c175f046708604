// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{clamp_progress, failure_message, DomainError};
use super::score::ThematicReport;

/// 审计实体
///
/// 表示一次针对单个域名的关键词/竞争对手审计请求。审计由
/// 创建操作以PENDING状态生成，随后由任务执行器推进到
/// CRAWLING → ANALYZING，最终终止于COMPLETED或FAILED。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    /// 审计唯一标识符，可对外分享
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 目标域名（已规范化：小写、无协议、无尾部斜杠）
    pub domain: String,
    /// 审计状态
    pub status: AuditStatus,
    /// 进度（0-100）
    pub progress: i32,
    /// 当前步骤标签
    pub current_step: Option<String>,
    /// 错误消息，仅在FAILED时存在
    pub error_message: Option<String>,
    /// 城市，用于生成本地关键词
    pub city: Option<String>,
    /// 州/省
    pub state: Option<String>,
    /// 商家名称
    pub business_name: Option<String>,
    /// 商家位置
    pub business_location: Option<String>,
    /// 商家 place id
    pub place_id: Option<String>,
    /// 目标关键词（0-20）
    pub keywords: Vec<String>,
    /// 竞争对手域名（0-5）
    pub competitors: Vec<String>,
    /// 分阶段结果
    pub step_results: StepResults,
    /// 总体得分，完成后写入
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 审计状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Crawling → Analyzing → Completed/Failed
/// 唯一的例外是 Failed → Pending（重试）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[default]
    Pending,
    Crawling,
    Analyzing,
    Completed,
    Failed,
}

impl AuditStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuditStatus::Completed | AuditStatus::Failed)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditStatus::Pending => write!(f, "pending"),
            AuditStatus::Crawling => write!(f, "crawling"),
            AuditStatus::Analyzing => write!(f, "analyzing"),
            AuditStatus::Completed => write!(f, "completed"),
            AuditStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AuditStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuditStatus::Pending),
            "crawling" => Ok(AuditStatus::Crawling),
            "analyzing" => Ok(AuditStatus::Analyzing),
            "completed" => Ok(AuditStatus::Completed),
            "failed" => Ok(AuditStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 审计流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Onpage,
    Serp,
    Backlinks,
    Business,
    Competitors,
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditStage::Onpage => write!(f, "onpage"),
            AuditStage::Serp => write!(f, "serp"),
            AuditStage::Backlinks => write!(f, "backlinks"),
            AuditStage::Business => write!(f, "business"),
            AuditStage::Competitors => write!(f, "competitors"),
        }
    }
}

/// 页面分析阶段结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnpageResult {
    pub url: String,
    pub status_code: Option<u16>,
    /// 原始布尔检查项
    pub checks: BTreeMap<String, bool>,
    /// 失败的错误级检查
    pub errors: Vec<String>,
    /// 失败的警告级检查
    pub warnings: Vec<String>,
    /// 失败的提示级检查
    pub notices: Vec<String>,
    /// 通过的检查数
    pub passed: usize,
    pub report: ThematicReport,
}

/// 单个关键词的排名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPosition {
    pub keyword: String,
    /// None 表示未出现在结果中
    pub position: Option<u32>,
    pub search_volume: Option<u64>,
    pub cpc: Option<f64>,
    pub url: Option<String>,
}

/// 搜索结果阶段结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
    pub location: Option<String>,
    pub keywords: Vec<KeywordPosition>,
}

/// 外链概要
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacklinksSummary {
    pub backlinks: u64,
    pub referring_domains: u64,
    pub domain_rank: Option<u32>,
    /// 引用域名列表，用于外链差距分析
    #[serde(default)]
    pub referring_domain_list: Vec<String>,
}

/// 商家资料
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub place_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub hours: Option<serde_json::Value>,
}

/// 竞争对手快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub domain: String,
    pub keywords: Vec<KeywordPosition>,
    pub backlinks: Option<BacklinksSummary>,
}

/// 竞争对手阶段结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorsResult {
    /// 竞争对手列表是否由服务发现（而非用户提供）
    pub discovered: bool,
    pub competitors: Vec<CompetitorSnapshot>,
}

/// 阶段结果
///
/// 每个变体携带该阶段强类型的负载，只在该阶段的远程计算
/// 返回后整体写入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "data", rename_all = "snake_case")]
pub enum StepResult {
    Onpage(OnpageResult),
    Serp(SerpResult),
    Backlinks(BacklinksSummary),
    Business(BusinessProfile),
    Competitors(CompetitorsResult),
}

impl StepResult {
    /// 结果所属的阶段
    pub fn stage(&self) -> AuditStage {
        match self {
            StepResult::Onpage(_) => AuditStage::Onpage,
            StepResult::Serp(_) => AuditStage::Serp,
            StepResult::Backlinks(_) => AuditStage::Backlinks,
            StepResult::Business(_) => AuditStage::Business,
            StepResult::Competitors(_) => AuditStage::Competitors,
        }
    }
}

/// 分阶段结果集合
///
/// 以阶段为键的开放结构，读取方按存在与否进行匹配，
/// 缺失的阶段视为“无数据”。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepResults(BTreeMap<AuditStage, StepResult>);

impl StepResults {
    /// 写入阶段结果，同一阶段再次写入会整体替换
    pub fn insert(&mut self, result: StepResult) {
        self.0.insert(result.stage(), result);
    }

    pub fn contains(&self, stage: AuditStage) -> bool {
        self.0.contains_key(&stage)
    }

    pub fn get(&self, stage: AuditStage) -> Option<&StepResult> {
        self.0.get(&stage)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn onpage(&self) -> Option<&OnpageResult> {
        match self.0.get(&AuditStage::Onpage) {
            Some(StepResult::Onpage(r)) => Some(r),
            _ => None,
        }
    }

    pub fn serp(&self) -> Option<&SerpResult> {
        match self.0.get(&AuditStage::Serp) {
            Some(StepResult::Serp(r)) => Some(r),
            _ => None,
        }
    }

    pub fn backlinks(&self) -> Option<&BacklinksSummary> {
        match self.0.get(&AuditStage::Backlinks) {
            Some(StepResult::Backlinks(r)) => Some(r),
            _ => None,
        }
    }

    pub fn business(&self) -> Option<&BusinessProfile> {
        match self.0.get(&AuditStage::Business) {
            Some(StepResult::Business(r)) => Some(r),
            _ => None,
        }
    }

    pub fn competitors(&self) -> Option<&CompetitorsResult> {
        match self.0.get(&AuditStage::Competitors) {
            Some(StepResult::Competitors(r)) => Some(r),
            _ => None,
        }
    }
}

impl Audit {
    /// 创建一个新的审计
    ///
    /// # 参数
    ///
    /// * `user_id` - 所属用户ID
    /// * `domain` - 已规范化的目标域名
    ///
    /// # 返回值
    ///
    /// 返回处于PENDING状态的审计
    pub fn new(user_id: Uuid, domain: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            domain,
            status: AuditStatus::Pending,
            progress: 0,
            current_step: None,
            error_message: None,
            city: None,
            state: None,
            business_name: None,
            business_location: None,
            place_id: None,
            keywords: Vec::new(),
            competitors: Vec::new(),
            step_results: StepResults::default(),
            score: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// 开始抓取阶段
    ///
    /// 将状态从Pending变更为Crawling，并记录开始时间
    pub fn begin_crawl(mut self) -> Result<Self, DomainError> {
        match self.status {
            AuditStatus::Pending => {
                let now = Utc::now();
                self.status = AuditStatus::Crawling;
                self.started_at = Some(now);
                self.current_step = Some(AuditStage::Onpage.to_string());
                self.progress = self.progress.max(10);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "begin crawl")),
        }
    }

    /// 开始分析阶段
    ///
    /// 将状态从Crawling变更为Analyzing
    pub fn begin_analysis(mut self) -> Result<Self, DomainError> {
        match self.status {
            AuditStatus::Crawling => {
                self.status = AuditStatus::Analyzing;
                self.current_step = Some(AuditStage::Serp.to_string());
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "begin analysis")),
        }
    }

    /// 更新当前步骤与进度
    ///
    /// 进度只增不减，并被限制在 [0, 100]
    pub fn advance(&mut self, step: AuditStage, progress: i64) -> Result<(), DomainError> {
        if self.status.is_terminal() || self.status == AuditStatus::Pending {
            return Err(DomainError::transition(self.status, "advance"));
        }
        self.current_step = Some(step.to_string());
        self.progress = self.progress.max(clamp_progress(progress));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 写入阶段结果
    pub fn record_step(&mut self, result: StepResult) -> Result<(), DomainError> {
        if self.status.is_terminal() || self.status == AuditStatus::Pending {
            return Err(DomainError::transition(self.status, "record step result"));
        }
        self.step_results.insert(result);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 完成审计
    ///
    /// 将状态从Analyzing变更为Completed，写入总体得分
    pub fn complete(mut self, score: i32) -> Result<Self, DomainError> {
        match self.status {
            AuditStatus::Analyzing => {
                let now = Utc::now();
                self.status = AuditStatus::Completed;
                self.score = Some(score.clamp(0, 100));
                self.progress = 100;
                self.current_step = None;
                self.completed_at = Some(now);
                self.updated_at = now;
                Ok(self)
            }
            _ => Err(DomainError::transition(self.status, "complete")),
        }
    }

    /// 标记审计失败
    ///
    /// 任意非终止状态都可以转换为Failed，消息始终非空
    pub fn fail(mut self, message: impl Into<String>) -> Result<Self, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::transition(self.status, "fail"));
        }
        let now = Utc::now();
        self.status = AuditStatus::Failed;
        self.error_message = Some(failure_message(message));
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }

    /// 重试审计
    ///
    /// 仅允许在Failed状态下执行，重置所有运行时字段并清空阶段结果
    pub fn retry(mut self) -> Result<Self, DomainError> {
        if self.status != AuditStatus::Failed {
            return Err(DomainError::InvalidStatus(format!(
                "audit can only be retried when failed, current status is {}",
                self.status
            )));
        }
        self.status = AuditStatus::Pending;
        self.progress = 0;
        self.current_step = None;
        self.error_message = None;
        self.started_at = None;
        self.completed_at = None;
        self.score = None;
        self.step_results.clear();
        self.updated_at = Utc::now();
        Ok(self)
    }
}
