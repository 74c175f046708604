// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 每个处理器按请求组装用例，并把用例错误映射为统一的错误响应
pub mod audit_handler;
pub mod geo_grid_handler;
pub mod scan_handler;
