// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 审计仓库（audit_repository）
/// - 全站扫描仓库（scan_repository）：扫描、摘要与去重页面
/// - 地理网格仓库（geo_grid_repository）：网格扫描与采样点
/// - 任务消息仓库（job_repository）：任务消息的投递与锁定
pub mod audit_repository;
pub mod geo_grid_repository;
pub mod job_repository;
pub mod scan_repository;
