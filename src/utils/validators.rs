// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;
use url::Url;

/// 验证错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 域名无效
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
    /// URL无效
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// 规范化域名
///
/// 去除协议、路径、端口和尾部的点/斜杠并转为小写，
/// `https://Example.com/about` → `example.com`
///
/// # 返回值
///
/// * `Ok(String)` - 规范化后的域名
/// * `Err(ValidationError)` - 输入不是合法域名
pub fn normalize_domain(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDomain("domain is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed =
        Url::parse(&with_scheme).map_err(|_| ValidationError::InvalidDomain(trimmed.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidDomain(trimmed.to_string()));
    }

    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_lowercase())
        .ok_or_else(|| ValidationError::InvalidDomain(trimmed.to_string()))?;

    if host.len() > 253 || !host.contains('.') {
        return Err(ValidationError::InvalidDomain(host));
    }
    let labels_ok = host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return Err(ValidationError::InvalidDomain(host));
    }
    Ok(host)
}

/// 验证起始URL属于给定域名
pub fn validate_start_url(url: &str, domain: &str) -> Result<String, ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }
    let host = parsed
        .host_str()
        .map(str::to_lowercase)
        .ok_or_else(|| ValidationError::InvalidUrl(url.to_string()))?;
    if host != domain && !host.ends_with(&format!(".{}", domain)) {
        return Err(ValidationError::InvalidUrl(format!(
            "{} is outside of {}",
            url, domain
        )));
    }
    Ok(parsed.to_string())
}
