// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含不依赖存储和外部服务的纯业务逻辑：
/// - 问题分级（issue_classifier）：将布尔检查项划分为错误/警告/提示/通过
/// - 主题评分（thematic_scorer）：计算六个分类得分与总体健康分
/// - 网格汇总（geo_grid_aggregator）：汇总网格采样点上的竞争对手排名
/// - 审计报告（audit_report）：竞争对手对比与外链差距
/// - 关键词规划（keyword_planner）：生成和清理审计关键词
pub mod audit_report;
pub mod geo_grid_aggregator;
pub mod issue_classifier;
pub mod keyword_planner;
pub mod thematic_scorer;
