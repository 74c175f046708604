// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 基于数据库的持久化任务队列，负责任务的投递、确认与重新排期
pub mod job_queue;
