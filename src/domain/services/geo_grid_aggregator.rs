// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 地理网格汇总
//!
//! 将一次扫描中所有采样点上的排名样本汇总为每个竞争对手的统计数据，
//! 目标商家本身作为一行普通数据参与同样的计算。

use crate::domain::models::geo_grid::{CompetitorAggregate, GridPoint};
use std::collections::{BTreeMap, HashMap};

/// 可见度权重表：`(排名上限, 权重)`，按排名上限升序排列
///
/// 超出最后一档的排名权重为0。
pub const SHARE_OF_VOICE_WEIGHTS: &[(u32, f64)] = &[
    (1, 1.0),
    (2, 0.85),
    (3, 0.7),
    (5, 0.5),
    (10, 0.3),
    (20, 0.1),
];

/// 排名对应的可见度权重
pub fn visibility_weight(rank: u32) -> f64 {
    if rank == 0 {
        return 0.0;
    }
    SHARE_OF_VOICE_WEIGHTS
        .iter()
        .find(|(max_rank, _)| rank <= *max_rank)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// 目标商家标识
#[derive(Debug, Clone, Copy)]
pub struct TargetBusiness<'a> {
    pub place_id: Option<&'a str>,
    pub name: &'a str,
}

impl TargetBusiness<'_> {
    fn key(&self) -> String {
        match self.place_id {
            Some(id) => id.to_string(),
            None => format!("target:{}", self.name),
        }
    }
}

#[derive(Default)]
struct Accumulator {
    name: String,
    appearances: u32,
    rank_sum: u64,
    top3: u32,
    top10: u32,
    top20: u32,
    visibility: f64,
    rating: Option<f64>,
    review_count: Option<u32>,
}

impl Accumulator {
    fn observe(&mut self, rank: u32) {
        self.appearances += 1;
        self.rank_sum += rank as u64;
        if rank <= 3 {
            self.top3 += 1;
        }
        if rank <= 10 {
            self.top10 += 1;
        }
        if rank <= 20 {
            self.top20 += 1;
        }
        self.visibility += visibility_weight(rank);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 汇总一次扫描的全部采样点
///
/// 未在任何采样点出现的竞争对手不会产生汇总行。结果按可见度降序、
/// 平均排名升序、名称升序排列。
pub fn aggregate(points: &[GridPoint], target: &TargetBusiness<'_>) -> Vec<CompetitorAggregate> {
    let target_key = target.key();
    let mut rows: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut samples: u64 = 0;

    for point in points {
        for ranking in &point.rankings {
            samples += 1;

            if let Some(rank) = ranking.target_rank {
                let acc = rows.entry(target_key.clone()).or_default();
                acc.name = target.name.to_string();
                acc.observe(rank);
            }

            for competitor in &ranking.competitors {
                if competitor.place_id == target_key {
                    // 目标商家已通过 target_rank 计数，这里只补充评分信息
                    if let Some(acc) = rows.get_mut(&target_key) {
                        acc.rating = competitor.rating.or(acc.rating);
                        acc.review_count = competitor.review_count.or(acc.review_count);
                    }
                    continue;
                }
                let acc = rows.entry(competitor.place_id.clone()).or_default();
                acc.name = competitor.name.clone();
                acc.rating = competitor.rating.or(acc.rating);
                acc.review_count = competitor.review_count.or(acc.review_count);
                acc.observe(competitor.rank);
            }
        }
    }

    let possible = samples as f64 * visibility_weight(1);
    let mut result: Vec<CompetitorAggregate> = rows
        .into_iter()
        .filter(|(_, acc)| acc.appearances > 0)
        .map(|(place_id, acc)| CompetitorAggregate {
            is_target: place_id == target_key,
            place_id,
            name: acc.name,
            appearances: acc.appearances,
            avg_rank: round2(acc.rank_sum as f64 / acc.appearances as f64),
            times_in_top3: acc.top3,
            times_in_top10: acc.top10,
            times_in_top20: acc.top20,
            share_of_voice: if possible > 0.0 {
                round2(100.0 * acc.visibility / possible)
            } else {
                0.0
            },
            rank_change: None,
            rating: acc.rating,
            review_count: acc.review_count,
        })
        .collect();

    result.sort_by(|a, b| {
        b.share_of_voice
            .total_cmp(&a.share_of_voice)
            .then(a.avg_rank.total_cmp(&b.avg_rank))
            .then_with(|| a.name.cmp(&b.name))
    });
    result
}

/// 汇总当前扫描，并与同一活动上一次完成的扫描比较平均排名
///
/// `rank_change` 为上一次平均排名减去本次平均排名，正数表示排名上升。
pub fn aggregate_with_history(
    current: &[GridPoint],
    previous: Option<&[GridPoint]>,
    target: &TargetBusiness<'_>,
) -> Vec<CompetitorAggregate> {
    let mut rows = aggregate(current, target);
    let Some(previous) = previous else {
        return rows;
    };
    let before: HashMap<String, f64> = aggregate(previous, target)
        .into_iter()
        .map(|row| (row.place_id, row.avg_rank))
        .collect();
    for row in &mut rows {
        row.rank_change = before.get(&row.place_id).map(|prev| round2(prev - row.avg_rank));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::geo_grid::{CompetitorSample, KeywordRanking};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample(place_id: &str, rank: u32) -> CompetitorSample {
        CompetitorSample {
            place_id: place_id.to_string(),
            name: place_id.to_uppercase(),
            rank,
            address: None,
            rating: Some(4.5),
            review_count: Some(10),
        }
    }

    fn point(row: i32, target_rank: Option<u32>, competitors: Vec<CompetitorSample>) -> GridPoint {
        GridPoint {
            id: Uuid::new_v4(),
            scan_id: Uuid::nil(),
            row,
            col: 0,
            lat: 0.0,
            lng: 0.0,
            rankings: vec![KeywordRanking {
                keyword: "dentist".to_string(),
                target_rank,
                competitors,
            }],
            sampled_at: Utc::now(),
        }
    }

    const TARGET: TargetBusiness<'static> = TargetBusiness {
        place_id: Some("me"),
        name: "Example Dental",
    };

    #[test]
    fn test_avg_rank_only_counts_appearances() {
        let points = vec![
            point(0, Some(1), vec![sample("a", 2)]),
            point(1, None, vec![sample("a", 6)]),
            point(2, None, vec![sample("b", 15)]),
        ];
        let rows = aggregate(&points, &TARGET);

        let a = rows.iter().find(|r| r.place_id == "a").unwrap();
        assert_eq!(a.appearances, 2);
        assert_eq!(a.avg_rank, 4.0);
        assert_eq!(a.times_in_top3, 1);
        assert_eq!(a.times_in_top10, 2);
        assert_eq!(a.times_in_top20, 2);

        let b = rows.iter().find(|r| r.place_id == "b").unwrap();
        assert_eq!(b.avg_rank, 15.0);
        assert_eq!(b.times_in_top10, 0);
        assert_eq!(b.times_in_top20, 1);
    }

    #[test]
    fn test_absent_competitors_have_no_row() {
        let points = vec![point(0, None, vec![]), point(1, None, vec![])];
        assert!(aggregate(&points, &TARGET).is_empty());
    }

    #[test]
    fn test_target_is_first_class_row() {
        let points = vec![
            point(0, Some(1), vec![sample("me", 1), sample("a", 2)]),
            point(1, Some(3), vec![sample("a", 1)]),
        ];
        let rows = aggregate(&points, &TARGET);
        assert_eq!(rows.len(), 2);

        let target = rows.iter().find(|r| r.is_target).unwrap();
        assert_eq!(target.name, "Example Dental");
        assert_eq!(target.appearances, 2);
        assert_eq!(target.avg_rank, 2.0);
        assert_eq!(target.rating, Some(4.5));
    }

    #[test]
    fn test_share_of_voice_denominator_includes_empty_points() {
        let points = vec![
            point(0, None, vec![sample("a", 1)]),
            point(1, None, vec![]),
        ];
        let rows = aggregate(&points, &TARGET);
        // 一次第一名，可能的可见度为两次采样
        assert_eq!(rows[0].share_of_voice, 50.0);
    }

    #[test]
    fn test_higher_rank_contributes_more_visibility() {
        assert!(visibility_weight(1) > visibility_weight(2));
        assert!(visibility_weight(3) > visibility_weight(10));
        assert!(visibility_weight(20) > visibility_weight(21));
        assert_eq!(visibility_weight(21), 0.0);

        let points = vec![point(0, None, vec![sample("a", 1), sample("b", 8)])];
        let rows = aggregate(&points, &TARGET);
        assert_eq!(rows[0].place_id, "a");
        assert!(rows[0].share_of_voice > rows[1].share_of_voice);
    }

    #[test]
    fn test_rank_change_against_previous_scan() {
        let previous = vec![point(0, Some(5), vec![sample("a", 2)])];
        let current = vec![point(0, Some(2), vec![sample("a", 4), sample("c", 9)])];
        let rows = aggregate_with_history(&current, Some(&previous), &TARGET);

        let target = rows.iter().find(|r| r.is_target).unwrap();
        assert_eq!(target.rank_change, Some(3.0));
        let a = rows.iter().find(|r| r.place_id == "a").unwrap();
        assert_eq!(a.rank_change, Some(-2.0));
        let c = rows.iter().find(|r| r.place_id == "c").unwrap();
        assert_eq!(c.rank_change, None);
    }
}
