// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 测试主模块
///
/// 基于内存 SQLite 的仓库、队列、HTTP 接口以及工作器流水线集成测试
mod integration;
