// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 每个用例负责一类资源的创建、查询与报告组装
pub mod audit_use_case;
pub mod geo_grid_use_case;
pub mod scan_use_case;
