// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 主题评分
//!
//! 由页面检查项、耗时指标和链接计数计算六个分类得分与总体健康分。

use crate::domain::models::scan::{CrawledPage, PageTiming, ScanPage, ScanSummary};
use crate::domain::models::score::{CategoryId, CategoryScore, ScoreStatus, ThematicReport};
use crate::domain::services::issue_classifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个数值指标的阈值与权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    /// 不高于该值为“好”
    pub good: f64,
    /// 不高于该值为“一般”
    pub moderate: f64,
    pub weight: f64,
}

/// 派生信号：SSL证书有效
pub const SSL_VALID: &str = "ssl_valid";
/// 派生信号：可交互时间不超过上限
pub const FAST_TIME_TO_INTERACTIVE: &str = "fast_time_to_interactive";
/// 派生信号：内部链接数量达到下限
pub const ENOUGH_INTERNAL_LINKS: &str = "enough_internal_links";
/// 派生信号：外部链接占比不超过上限
pub const GOOD_EXTERNAL_RATIO: &str = "good_external_ratio";

/// 信号权重，键为检查项ID或派生信号名
pub type SignalWeights = BTreeMap<String, f64>;

fn signal_weights(pairs: &[(&str, f64)]) -> SignalWeights {
    pairs.iter().map(|(name, w)| (name.to_string(), *w)).collect()
}

/// 各布尔分类的信号权重
///
/// 配置某个分类时整体替换该分类的默认表，未配置的分类保持默认。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub crawlability: SignalWeights,
    pub https: SignalWeights,
    pub performance: SignalWeights,
    pub internal_linking: SignalWeights,
    pub markup: SignalWeights,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            crawlability: signal_weights(&[
                ("is_4xx_code", 3.0),
                ("is_5xx_code", 3.0),
                ("is_broken", 3.0),
                ("canonical", 2.0),
                ("redirect_chain", 1.0),
                ("is_orphan_page", 1.0),
                ("has_meta_refresh_redirect", 1.0),
            ]),
            https: signal_weights(&[
                ("is_https", 3.0),
                ("https_to_http_links", 2.0),
                (SSL_VALID, 3.0),
            ]),
            performance: signal_weights(&[
                ("high_loading_time", 3.0),
                ("high_waiting_time", 2.0),
                ("large_page_size", 2.0),
                ("no_content_encoding", 1.0),
                ("has_render_blocking_resources", 1.0),
                (FAST_TIME_TO_INTERACTIVE, 2.0),
            ]),
            internal_linking: signal_weights(&[
                (ENOUGH_INTERNAL_LINKS, 3.0),
                (GOOD_EXTERNAL_RATIO, 2.0),
                ("is_orphan_page", 2.0),
                ("has_links_to_redirects", 1.0),
            ]),
            markup: signal_weights(&[
                ("no_title", 3.0),
                ("no_description", 2.0),
                ("no_h1_tag", 2.0),
                ("has_html_doctype", 1.0),
                ("no_image_alt", 1.0),
                ("duplicate_title_tag", 1.0),
                ("title_too_long", 1.0),
                ("deprecated_html_tags", 1.0),
            ]),
        }
    }
}

/// 评分配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// 布尔分类的信号权重
    pub weights: CategoryWeights,
    /// Largest Contentful Paint（毫秒）
    pub lcp: MetricThreshold,
    /// First Input Delay（毫秒）
    pub fid: MetricThreshold,
    /// Cumulative Layout Shift
    pub cls: MetricThreshold,
    /// 内部链接数量下限
    pub min_internal_links: u32,
    /// 外部链接占比上限
    pub max_external_ratio: f64,
    /// 可交互时间上限（毫秒）
    pub max_time_to_interactive_ms: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            lcp: MetricThreshold {
                good: 2500.0,
                moderate: 4000.0,
                weight: 4.0,
            },
            fid: MetricThreshold {
                good: 100.0,
                moderate: 300.0,
                weight: 3.0,
            },
            cls: MetricThreshold {
                good: 0.1,
                moderate: 0.25,
                weight: 3.0,
            },
            min_internal_links: 3,
            max_external_ratio: 0.5,
            max_time_to_interactive_ms: 3800.0,
        }
    }
}

/// 评分所需的页面信号
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    pub checks: BTreeMap<String, bool>,
    pub timing: PageTiming,
    pub internal_links: Option<u32>,
    pub external_links: Option<u32>,
    /// 来自扫描摘要的SSL证书有效性
    pub ssl_valid: Option<bool>,
}

impl PageSignals {
    pub fn from_crawled(page: &CrawledPage) -> Self {
        Self {
            checks: page
                .checks
                .iter()
                .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                .collect(),
            timing: page.timing.clone(),
            internal_links: page.meta.internal_links_count,
            external_links: page.meta.external_links_count,
            ssl_valid: None,
        }
    }

    pub fn from_scan_page(page: &ScanPage) -> Self {
        Self {
            checks: page.boolean_checks(),
            timing: page.timing.clone(),
            internal_links: page.internal_links,
            external_links: page.external_links,
            ssl_valid: None,
        }
    }

    /// 用扫描摘要中的站点级指标补充页面信号
    pub fn with_summary(mut self, summary: &ScanSummary) -> Self {
        if summary.avg_lcp.is_some() {
            self.timing.lcp = summary.avg_lcp;
        }
        if summary.avg_cls.is_some() {
            self.timing.cls = summary.avg_cls;
        }
        self.ssl_valid = summary.ssl_valid();
        self
    }

    /// 检查项是否通过，极性取自检查项定义表；表中没有的检查项以 true 为通过
    fn passes(&self, name: &str) -> Option<bool> {
        let value = self.checks.get(name).copied()?;
        Some(match issue_classifier::definition(name) {
            Some(def) => !def.fails(value),
            None => value,
        })
    }
}

/// 通用加权布尔评分
///
/// 空值不计入总权重；总权重为0时得分为0。
pub fn weighted_score(signals: &[(Option<bool>, f64)]) -> i32 {
    let mut total = 0.0;
    let mut score = 0.0;
    for (value, weight) in signals {
        if let Some(v) = value {
            total += weight;
            if *v {
                score += weight;
            }
        }
    }
    if total <= 0.0 {
        return 0;
    }
    (100.0 * score / total).round() as i32
}

/// 主题评分器
#[derive(Debug, Clone, Default)]
pub struct ThematicScorer {
    config: ScoringConfig,
}

impl ThematicScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// 计算完整的主题评分报告
    pub fn score(&self, signals: &PageSignals) -> ThematicReport {
        report_from(CategoryId::ALL.map(|id| self.category(id, signals)))
    }

    pub fn category(&self, id: CategoryId, signals: &PageSignals) -> CategoryScore {
        match id {
            CategoryId::Crawlability => self.crawlability(signals),
            CategoryId::Https => self.https(signals),
            CategoryId::CoreWebVitals => self.core_web_vitals(&signals.timing),
            CategoryId::Performance => self.performance(signals),
            CategoryId::InternalLinking => self.internal_linking(signals),
            CategoryId::Markup => self.markup(signals),
        }
    }

    fn weighted(weights: &SignalWeights, resolve: impl Fn(&str) -> Option<bool>) -> i32 {
        let pairs: Vec<(Option<bool>, f64)> = weights
            .iter()
            .map(|(name, weight)| (resolve(name), *weight))
            .collect();
        weighted_score(&pairs)
    }

    pub fn crawlability(&self, s: &PageSignals) -> CategoryScore {
        let score = Self::weighted(&self.config.weights.crawlability, |name| s.passes(name));
        CategoryScore::new(CategoryId::Crawlability, score)
    }

    pub fn https(&self, s: &PageSignals) -> CategoryScore {
        let score = Self::weighted(&self.config.weights.https, |name| match name {
            SSL_VALID => s.ssl_valid,
            _ => s.passes(name),
        });
        CategoryScore::new(CategoryId::Https, score)
    }

    /// 核心网页指标
    ///
    /// 每个指标仅在有数值时计入总权重；不高于“好”阈值得全部权重，
    /// 介于“好”与“一般”之间得一半权重。
    pub fn core_web_vitals(&self, timing: &PageTiming) -> CategoryScore {
        let mut total = 0.0;
        let mut score = 0.0;
        for (value, threshold) in [
            (timing.lcp, &self.config.lcp),
            (timing.fid, &self.config.fid),
            (timing.cls, &self.config.cls),
        ] {
            let Some(value) = value else { continue };
            total += threshold.weight;
            if value <= threshold.good {
                score += threshold.weight;
            } else if value <= threshold.moderate {
                score += threshold.weight / 2.0;
            }
        }
        let score = if total <= 0.0 {
            0
        } else {
            (100.0 * score / total).round() as i32
        };
        CategoryScore::new(CategoryId::CoreWebVitals, score)
    }

    pub fn performance(&self, s: &PageSignals) -> CategoryScore {
        let fast_interactive = s
            .timing
            .time_to_interactive
            .map(|tti| tti <= self.config.max_time_to_interactive_ms);
        let score = Self::weighted(&self.config.weights.performance, |name| match name {
            FAST_TIME_TO_INTERACTIVE => fast_interactive,
            _ => s.passes(name),
        });
        CategoryScore::new(CategoryId::Performance, score)
    }

    pub fn internal_linking(&self, s: &PageSignals) -> CategoryScore {
        let enough_internal = s.internal_links.map(|n| n >= self.config.min_internal_links);
        let good_external_ratio = match (s.internal_links, s.external_links) {
            (None, None) => None,
            (internal, external) => {
                let internal = internal.unwrap_or(0) as f64;
                let external = external.unwrap_or(0) as f64;
                let ratio = if internal + external == 0.0 {
                    0.0
                } else {
                    external / (internal + external)
                };
                Some(ratio <= self.config.max_external_ratio)
            }
        };
        let score = Self::weighted(&self.config.weights.internal_linking, |name| match name {
            ENOUGH_INTERNAL_LINKS => enough_internal,
            GOOD_EXTERNAL_RATIO => good_external_ratio,
            _ => s.passes(name),
        });
        CategoryScore::new(CategoryId::InternalLinking, score)
    }

    pub fn markup(&self, s: &PageSignals) -> CategoryScore {
        let score = Self::weighted(&self.config.weights.markup, |name| s.passes(name));
        CategoryScore::new(CategoryId::Markup, score)
    }
}

/// 由六个分类得分组装报告，总体分为六者的算术平均（四舍五入）
pub fn report_from(categories: [CategoryScore; 6]) -> ThematicReport {
    let sum: i32 = categories.iter().map(|c| c.score).sum();
    let overall_score = (sum as f64 / categories.len() as f64).round() as i32;
    ThematicReport {
        categories,
        overall_score,
        overall_status: ScoreStatus::from_score(overall_score),
    }
}
