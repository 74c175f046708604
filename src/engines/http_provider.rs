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

use crate::config::settings::ProviderSettings;
use crate::domain::models::audit::{BacklinksSummary, BusinessProfile, KeywordPosition};
use crate::domain::models::geo_grid::CompetitorSample;
use crate::domain::models::scan::{CrawlConfig, CrawledPage};
use crate::domain::providers::{
    CrawlProvider, CrawlSummaryRecord, CrawlTaskStatus, PageBatch, PlacesProvider, ProviderError,
    RankProvider, RankQuery,
};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// 外部服务统一响应信封
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TaskAccepted {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct RankingsData {
    keywords: Vec<KeywordPosition>,
}

#[derive(Debug, Deserialize)]
struct CompetitorDomains {
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BusinessLookup {
    business: Option<BusinessProfile>,
}

#[derive(Debug, Deserialize)]
struct LocalResults {
    results: Vec<CompetitorSample>,
}

#[derive(Debug, Serialize)]
struct SubmitCrawlBody<'a> {
    target: &'a str,
    #[serde(flatten)]
    config: &'a CrawlConfig,
}

/// 基于reqwest的外部数据服务客户端
///
/// 同时实现抓取、排名和地点三个服务接口。可重试错误按
/// `RetryPolicy` 指数退避重试。
#[derive(Clone)]
pub struct HttpProviderClient {
    client: reqwest::Client,
    base_url: String,
    login: Option<String>,
    password: Option<String>,
    retry: RetryPolicy,
}

impl HttpProviderClient {
    /// 根据配置创建客户端
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("auditrs/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            login: settings.login.clone(),
            password: settings.password.clone(),
            retry: RetryPolicy::for_provider(settings.max_retries),
        })
    }

    /// 替换重试策略
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.call_once(method.clone(), path, query, body).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    attempt += 1;
                    let backoff = self.retry.calculate_backoff(attempt);
                    warn!(
                        "Provider call {} failed ({}), retry {} in {:?}",
                        path, e, attempt, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url).query(query);
        if let Some(login) = &self.login {
            request = request.basic_auth(login, self.password.as_deref());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!("Provider {} responded {} ({} bytes)", path, status, bytes.len());

        let envelope: Option<Envelope<T>> = serde_json::from_slice(&bytes).ok();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if status.is_server_error() {
            return Err(ProviderError::Network(format!("provider returned {}", status)));
        }
        if !status.is_success() {
            let message = envelope
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("provider returned {}", status));
            return Err(ProviderError::Upstream(message));
        }

        let envelope = match envelope {
            Some(envelope) => envelope,
            None => {
                return Err(ProviderError::InvalidResponse(format!(
                    "unexpected payload from {}",
                    path
                )))
            }
        };
        if let Some(message) = envelope.error {
            return Err(ProviderError::Upstream(message));
        }
        envelope
            .data
            .ok_or_else(|| ProviderError::InvalidResponse(format!("missing data in {}", path)))
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl CrawlProvider for HttpProviderClient {
    async fn submit_crawl(&self, target: &str, config: &CrawlConfig) -> Result<String, ProviderError> {
        let body = serde_json::to_value(SubmitCrawlBody { target, config })
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let accepted: TaskAccepted = self
            .call(Method::POST, "/v1/crawl/tasks", &[], Some(&body))
            .await?;
        Ok(accepted.task_id)
    }

    async fn crawl_status(&self, task_id: &str) -> Result<CrawlTaskStatus, ProviderError> {
        self.call(Method::GET, &format!("/v1/crawl/tasks/{}", task_id), &[], None)
            .await
    }

    async fn fetch_pages(&self, task_id: &str, offset: u32, limit: u32) -> Result<PageBatch, ProviderError> {
        self.call(
            Method::GET,
            &format!("/v1/crawl/tasks/{}/pages", task_id),
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
            None,
        )
        .await
    }

    async fn fetch_summary(&self, task_id: &str) -> Result<CrawlSummaryRecord, ProviderError> {
        self.call(
            Method::GET,
            &format!("/v1/crawl/tasks/{}/summary", task_id),
            &[],
            None,
        )
        .await
    }

    async fn instant_page(&self, url: &str, use_cache: bool) -> Result<CrawledPage, ProviderError> {
        let body = json!({ "url": url, "use_cache": use_cache });
        self.call(Method::POST, "/v1/onpage/instant", &[], Some(&body))
            .await
    }
}

#[async_trait]
impl RankProvider for HttpProviderClient {
    async fn keyword_rankings(&self, query: &RankQuery) -> Result<Vec<KeywordPosition>, ProviderError> {
        let body = json!({
            "domain": query.domain,
            "keywords": query.keywords,
            "location": query.location,
            "use_cache": query.use_cache,
        });
        let data: RankingsData = self
            .call(Method::POST, "/v1/serp/rankings", &[], Some(&body))
            .await?;
        Ok(data.keywords)
    }

    async fn backlinks_summary(&self, domain: &str, use_cache: bool) -> Result<BacklinksSummary, ProviderError> {
        self.call(
            Method::GET,
            "/v1/backlinks/summary",
            &[("domain", domain.to_string()), ("use_cache", use_cache.to_string())],
            None,
        )
        .await
    }

    async fn competitor_domains(
        &self,
        domain: &str,
        location: Option<String>,
        limit: u32,
    ) -> Result<Vec<String>, ProviderError> {
        let body = json!({ "domain": domain, "location": location, "limit": limit });
        let data: CompetitorDomains = self
            .call(Method::POST, "/v1/competitors", &[], Some(&body))
            .await?;
        Ok(data.domains)
    }
}

#[async_trait]
impl PlacesProvider for HttpProviderClient {
    async fn find_business(
        &self,
        name: &str,
        location: Option<String>,
    ) -> Result<Option<BusinessProfile>, ProviderError> {
        let body = json!({ "name": name, "location": location });
        let data: BusinessLookup = self
            .call(Method::POST, "/v1/places/search", &[], Some(&body))
            .await?;
        Ok(data.business)
    }

    async fn local_rankings(&self, keyword: &str, lat: f64, lng: f64) -> Result<Vec<CompetitorSample>, ProviderError> {
        let body = json!({ "keyword": keyword, "lat": lat, "lng": lng });
        let data: LocalResults = self
            .call(Method::POST, "/v1/places/rankings", &[], Some(&body))
            .await?;
        Ok(data.results)
    }
}

#[cfg(test)]
#[path = "http_provider_test.rs"]
mod tests;
