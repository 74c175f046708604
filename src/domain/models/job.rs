// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 任务消息实体
///
/// 表示一条投递给任务执行器的消息。投递语义为“至少一次”，
/// 执行器必须保证所有外部可见的副作用都是幂等的。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务类型，决定由哪个执行器处理
    pub job_type: JobType,
    /// 任务状态
    pub status: JobStatus,
    /// 任务负载数据
    pub payload: serde_json::Value,
    /// 已尝试次数，每次被取出时加一
    pub attempt_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 计划执行时间，到期前不会被取出
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// 锁定令牌，持有该任务的工作器ID
    pub lock_token: Option<Uuid>,
    /// 锁定过期时间，过期后任务可被重新投递
    pub lock_expires_at: Option<DateTime<Utc>>,
}

/// 任务类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// 执行关键词/竞争对手审计
    Audit,
    /// 提交全站扫描
    SiteScan,
    /// 轮询全站扫描并拉取结果
    SiteScanPoll,
    /// 执行地理网格扫描
    GeoGrid,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobType::Audit => write!(f, "audit"),
            JobType::SiteScan => write!(f, "site_scan"),
            JobType::SiteScanPoll => write!(f, "site_scan_poll"),
            JobType::GeoGrid => write!(f, "geo_grid"),
        }
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audit" => Ok(JobType::Audit),
            "site_scan" => Ok(JobType::SiteScan),
            "site_scan_poll" => Ok(JobType::SiteScanPoll),
            "geo_grid" => Ok(JobType::GeoGrid),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// Queued → Active → Completed/Failed，Active 也可以被重新排期回 Queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Active,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Active => write!(f, "active"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 审计任务负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditJobPayload {
    pub audit_id: Uuid,
    /// 为 true 时不得复用上游缓存结果
    #[serde(default)]
    pub skip_cache: bool,
}

/// 全站扫描任务负载（提交与轮询共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJobPayload {
    pub scan_id: Uuid,
    /// 已经执行过的轮询次数
    #[serde(default)]
    pub poll_attempt: u32,
}

/// 地理网格任务负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoGridJobPayload {
    pub scan_id: Uuid,
}

impl Job {
    /// 创建一个新的任务
    ///
    /// # 参数
    ///
    /// * `job_type` - 任务类型
    /// * `payload` - 任务负载数据
    ///
    /// # 返回值
    ///
    /// 返回处于Queued状态的新任务
    pub fn new(job_type: JobType, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Queued,
            payload,
            attempt_count: 0,
            max_retries: 3,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            lock_token: None,
            lock_expires_at: None,
        }
    }

    /// 创建审计任务
    pub fn audit(audit_id: Uuid, skip_cache: bool) -> Self {
        Self::new(
            JobType::Audit,
            serde_json::json!({ "audit_id": audit_id, "skip_cache": skip_cache }),
        )
    }

    /// 创建全站扫描提交任务
    pub fn site_scan(scan_id: Uuid) -> Self {
        Self::new(JobType::SiteScan, serde_json::json!({ "scan_id": scan_id }))
    }

    /// 创建延迟执行的全站扫描轮询任务
    pub fn site_scan_poll(scan_id: Uuid, poll_attempt: u32, delay: chrono::Duration) -> Self {
        let mut job = Self::new(
            JobType::SiteScanPoll,
            serde_json::json!({ "scan_id": scan_id, "poll_attempt": poll_attempt }),
        );
        job.scheduled_at = Some(Utc::now() + delay);
        job
    }

    /// 创建地理网格扫描任务
    pub fn geo_grid(scan_id: Uuid) -> Self {
        Self::new(JobType::GeoGrid, serde_json::json!({ "scan_id": scan_id }))
    }

    /// 按类型解析负载
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// 判断任务失败后是否可以重试
    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_retries
    }
}
