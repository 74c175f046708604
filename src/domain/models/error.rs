// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 领域错误类型
///
/// 表示在领域层可能发生的各种错误情况，包括状态转换错误、
/// 完成前置条件不满足以及验证失败。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换，当前状态不允许执行目标操作
    #[error("Invalid state transition: cannot {action} while {from}")]
    InvalidStateTransition {
        /// 当前状态
        from: String,
        /// 尝试执行的操作
        action: &'static str,
    },

    /// 无效状态，用于只允许在特定状态下执行的显式操作（如重试）
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// 前置条件不满足，例如扫描摘要尚未持久化就尝试完成扫描
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    pub(crate) fn transition(from: impl ToString, action: &'static str) -> Self {
        DomainError::InvalidStateTransition {
            from: from.to_string(),
            action,
        }
    }
}

/// 失败消息兜底，终止于FAILED的任务必须携带可读的消息
pub(crate) fn failure_message(message: impl Into<String>) -> String {
    let message = message.into();
    if message.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

/// 将外部提供的进度值限制在 [0, 100]
pub fn clamp_progress(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}
