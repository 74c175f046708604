// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 审计报告读模型
//!
//! 从审计的分阶段结果中派生竞争对手对比与外链差距。缺失的阶段
//! 视为无数据，对应的读模型返回空列表。

use crate::domain::models::audit::{BacklinksSummary, KeywordPosition, StepResults};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// 竞争对手对比中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub domain: String,
    pub is_target: bool,
    /// 有排名的关键词数
    pub ranked_keywords: usize,
    /// 排名前10的关键词数
    pub top10_keywords: usize,
    /// 有排名关键词的平均排名
    pub avg_position: Option<f64>,
    pub backlinks: Option<u64>,
    pub referring_domains: Option<u64>,
    pub domain_rank: Option<u32>,
}

impl ComparisonRow {
    fn build(
        domain: &str,
        is_target: bool,
        keywords: &[KeywordPosition],
        backlinks: Option<&BacklinksSummary>,
    ) -> Self {
        let positions: Vec<u32> = keywords.iter().filter_map(|k| k.position).collect();
        let avg_position = if positions.is_empty() {
            None
        } else {
            let sum: u64 = positions.iter().map(|p| *p as u64).sum();
            Some(((sum as f64 / positions.len() as f64) * 10.0).round() / 10.0)
        };
        Self {
            domain: domain.to_string(),
            is_target,
            ranked_keywords: positions.len(),
            top10_keywords: positions.iter().filter(|p| **p <= 10).count(),
            avg_position,
            backlinks: backlinks.map(|b| b.backlinks),
            referring_domains: backlinks.map(|b| b.referring_domains),
            domain_rank: backlinks.and_then(|b| b.domain_rank),
        }
    }
}

/// 外链差距：链接到竞争对手但没有链接到目标域名的引用域名
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklinkGap {
    pub referring_domain: String,
    /// 该域名链接到的竞争对手
    pub competitors: Vec<String>,
}

/// 目标域名与竞争对手的对比
///
/// 没有竞争对手阶段结果时返回空列表，目标行始终位于首位。
pub fn competitor_comparison(domain: &str, results: &StepResults) -> Vec<ComparisonRow> {
    let Some(competitors) = results.competitors() else {
        return Vec::new();
    };
    let target_keywords = results.serp().map(|s| s.keywords.as_slice()).unwrap_or(&[]);

    let mut rows = Vec::with_capacity(competitors.competitors.len() + 1);
    rows.push(ComparisonRow::build(
        domain,
        true,
        target_keywords,
        results.backlinks(),
    ));
    for competitor in &competitors.competitors {
        rows.push(ComparisonRow::build(
            &competitor.domain,
            false,
            &competitor.keywords,
            competitor.backlinks.as_ref(),
        ));
    }
    rows
}

/// 外链差距分析
///
/// 需要目标域名和至少一个竞争对手的外链数据，结果按覆盖的竞争对手数
/// 降序、域名升序排列。
pub fn backlink_gap(results: &StepResults) -> Vec<BacklinkGap> {
    let (Some(target), Some(competitors)) = (results.backlinks(), results.competitors()) else {
        return Vec::new();
    };
    let own: BTreeSet<&str> = target
        .referring_domain_list
        .iter()
        .map(String::as_str)
        .collect();

    let mut gaps: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for competitor in &competitors.competitors {
        let Some(backlinks) = &competitor.backlinks else {
            continue;
        };
        for referring in &backlinks.referring_domain_list {
            if own.contains(referring.as_str()) {
                continue;
            }
            let entry = gaps.entry(referring.as_str()).or_default();
            if !entry.contains(&competitor.domain) {
                entry.push(competitor.domain.clone());
            }
        }
    }

    let mut out: Vec<BacklinkGap> = gaps
        .into_iter()
        .map(|(referring_domain, competitors)| BacklinkGap {
            referring_domain: referring_domain.to_string(),
            competitors,
        })
        .collect();
    out.sort_by(|a, b| {
        b.competitors
            .len()
            .cmp(&a.competitors.len())
            .then_with(|| a.referring_domain.cmp(&b.referring_domain))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::audit::{CompetitorSnapshot, CompetitorsResult, SerpResult, StepResult};

    fn position(keyword: &str, position: Option<u32>) -> KeywordPosition {
        KeywordPosition {
            keyword: keyword.to_string(),
            position,
            search_volume: None,
            cpc: None,
            url: None,
        }
    }

    fn links(domains: &[&str]) -> BacklinksSummary {
        BacklinksSummary {
            backlinks: domains.len() as u64 * 10,
            referring_domains: domains.len() as u64,
            domain_rank: Some(20),
            referring_domain_list: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn full_results() -> StepResults {
        let mut results = StepResults::default();
        results.insert(StepResult::Serp(SerpResult {
            location: None,
            keywords: vec![position("dentist", Some(4)), position("dentist austin", None)],
        }));
        results.insert(StepResult::Backlinks(links(&["a.com", "b.com"])));
        results.insert(StepResult::Competitors(CompetitorsResult {
            discovered: false,
            competitors: vec![
                CompetitorSnapshot {
                    domain: "rival.com".to_string(),
                    keywords: vec![position("dentist", Some(1)), position("dentist austin", Some(12))],
                    backlinks: Some(links(&["a.com", "c.com", "d.com"])),
                },
                CompetitorSnapshot {
                    domain: "other.com".to_string(),
                    keywords: vec![],
                    backlinks: Some(links(&["c.com"])),
                },
            ],
        }));
        results
    }

    #[test]
    fn test_missing_stages_yield_empty_reports() {
        let empty = StepResults::default();
        assert!(competitor_comparison("example.com", &empty).is_empty());
        assert!(backlink_gap(&empty).is_empty());
    }

    #[test]
    fn test_competitor_comparison_rows() {
        let rows = competitor_comparison("example.com", &full_results());
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_target);
        assert_eq!(rows[0].ranked_keywords, 1);
        assert_eq!(rows[0].avg_position, Some(4.0));
        assert_eq!(rows[1].domain, "rival.com");
        assert_eq!(rows[1].top10_keywords, 1);
        assert_eq!(rows[1].avg_position, Some(6.5));
        assert_eq!(rows[2].avg_position, None);
    }

    #[test]
    fn test_backlink_gap_excludes_own_referrers() {
        let gaps = backlink_gap(&full_results());
        let domains: Vec<&str> = gaps.iter().map(|g| g.referring_domain.as_str()).collect();
        assert_eq!(domains, vec!["c.com", "d.com"]);
        assert_eq!(gaps[0].competitors, vec!["rival.com".to_string(), "other.com".to_string()]);
    }
}
