// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求 DTO 与审计、扫描、地理网格用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、评分服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 外部 SEO 数据服务的 HTTP 客户端
pub mod engines;

/// 基础设施模块
///
/// 数据库连接、实体映射、仓库实现与指标
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和提取器
pub mod presentation;

/// 队列模块
///
/// 实现持久化任务队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 审计、扫描、网格执行器以及看门狗
pub mod workers;

#[cfg(test)]
pub(crate) mod mocks;
