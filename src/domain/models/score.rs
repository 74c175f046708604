// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 主题分类标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    /// 可抓取性
    Crawlability,
    /// 传输安全
    Https,
    /// 核心网页指标
    CoreWebVitals,
    /// 性能
    Performance,
    /// 内部链接
    InternalLinking,
    /// 标记
    Markup,
}

impl CategoryId {
    /// 全部六个分类，顺序即报告中的展示顺序
    pub const ALL: [CategoryId; 6] = [
        CategoryId::Crawlability,
        CategoryId::Https,
        CategoryId::CoreWebVitals,
        CategoryId::Performance,
        CategoryId::InternalLinking,
        CategoryId::Markup,
    ];

    /// 分类的展示标题
    pub fn title(&self) -> &'static str {
        match self {
            CategoryId::Crawlability => "Crawlability",
            CategoryId::Https => "HTTPS",
            CategoryId::CoreWebVitals => "Core Web Vitals",
            CategoryId::Performance => "Performance",
            CategoryId::InternalLinking => "Internal Linking",
            CategoryId::Markup => "Markup",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryId::Crawlability => write!(f, "crawlability"),
            CategoryId::Https => write!(f, "https"),
            CategoryId::CoreWebVitals => write!(f, "core_web_vitals"),
            CategoryId::Performance => write!(f, "performance"),
            CategoryId::InternalLinking => write!(f, "internal_linking"),
            CategoryId::Markup => write!(f, "markup"),
        }
    }
}

/// 分数等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// 分数 >= 80
    Good,
    /// 分数 >= 50
    Moderate,
    /// 其余
    Poor,
}

impl ScoreStatus {
    /// 根据分数计算等级
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            ScoreStatus::Good
        } else if score >= 50 {
            ScoreStatus::Moderate
        } else {
            ScoreStatus::Poor
        }
    }
}

/// 单个主题分类的得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub id: CategoryId,
    pub title: String,
    /// 取值范围 [0, 100]
    pub score: i32,
    pub status: ScoreStatus,
}

impl CategoryScore {
    pub fn new(id: CategoryId, score: i32) -> Self {
        let score = score.clamp(0, 100);
        Self {
            id,
            title: id.title().to_string(),
            score,
            status: ScoreStatus::from_score(score),
        }
    }
}

/// 主题评分报告
///
/// 固定包含六个分类得分以及由它们求得的总体健康分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicReport {
    pub categories: [CategoryScore; 6],
    pub overall_score: i32,
    pub overall_status: ScoreStatus,
}

impl ThematicReport {
    /// 按分类标识查找得分
    pub fn category(&self, id: CategoryId) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.id == id)
    }
}
