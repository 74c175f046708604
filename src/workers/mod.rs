// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 任务工作者从队列取出任务并路由到审计、全站扫描和地理网格执行器；
/// 看门狗负责清理停滞的记录与过期的任务锁
pub mod audit_executor;
pub mod geo_grid_executor;
pub mod job_worker;
pub mod manager;
pub mod scan_executor;
pub mod watchdog_worker;
pub mod worker;

pub use worker::{JobHandler, Worker};
