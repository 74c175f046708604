// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：审计、扫描、地理网格等实体及其状态机
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 外部服务接口（providers）：抓取、排名和地点数据服务的抽象
/// - 服务（services）：问题分类、主题评分、网格汇总等纯业务逻辑
///
/// 领域层是系统的核心，不依赖于任何外部实现。
pub mod models;
pub mod providers;
pub mod repositories;
pub mod services;
