// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 审计（audit）：关键词/竞争对手审计及其分阶段结果
/// - 全站扫描（scan）：抓取任务、扫描摘要和扫描页面
/// - 地理网格（geo_grid）：网格扫描、采样点和竞争对手汇总
/// - 任务（job）：投递给执行器的任务消息
/// - 评分（score）：主题分类得分
///
/// 审计、扫描和地理网格都以显式状态机建模，状态只能通过
/// 实体上定义的转换方法改变。
pub mod audit;
pub mod error;
pub mod geo_grid;
pub mod job;
pub mod scan;
pub mod score;

pub use error::DomainError;
