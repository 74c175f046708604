// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口基于SeaORM的具体实现
pub mod audit_repo_impl;
pub mod geo_grid_repo_impl;
pub mod job_repo_impl;
pub mod scan_repo_impl;

use crate::domain::repositories::job_repository::RepositoryError;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::DbErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn to_utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

pub(crate) fn to_db_time(value: DateTime<Utc>) -> DateTime<FixedOffset> {
    value.into()
}

/// 解码JSON列
pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value, column: &str) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Corrupted(format!("column '{}': {}", column, e)))
}

/// 编码JSON列
pub(crate) fn encode<T: Serialize>(value: &T, column: &str) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::Corrupted(format!("column '{}': {}", column, e)))
}

/// 解析状态列
pub(crate) fn parse_status<T: std::str::FromStr>(value: &str, kind: &str) -> Result<T, RepositoryError> {
    value
        .parse()
        .map_err(|_| RepositoryError::Corrupted(format!("unknown {} status '{}'", kind, value)))
}

/// 整行更新时未命中记录视为未找到
pub(crate) fn map_update_err(err: DbErr) -> RepositoryError {
    match err {
        DbErr::RecordNotUpdated => RepositoryError::NotFound,
        other => RepositoryError::Database(other),
    }
}
