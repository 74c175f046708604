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

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::settings::AuditSettings;
use crate::domain::models::audit::{
    Audit, AuditStage, AuditStatus, CompetitorSnapshot, CompetitorsResult, OnpageResult, SerpResult,
    StepResult,
};
use crate::domain::models::job::{AuditJobPayload, Job};
use crate::domain::providers::{CrawlProvider, PlacesProvider, ProviderError, RankProvider, RankQuery};
use crate::domain::repositories::audit_repository::AuditRepository;
use crate::domain::services::issue_classifier::classify;
use crate::domain::services::keyword_planner::{generate_keywords, MAX_KEYWORDS};
use crate::domain::services::thematic_scorer::{PageSignals, ThematicScorer};
use crate::utils::errors::WorkerError;
use crate::workers::worker::JobHandler;

/// 分析阶段的执行顺序
const ANALYSIS_STAGES: [AuditStage; 4] = [
    AuditStage::Serp,
    AuditStage::Backlinks,
    AuditStage::Business,
    AuditStage::Competitors,
];

/// 阶段完成后的进度
fn stage_progress(stage: AuditStage) -> i64 {
    match stage {
        AuditStage::Onpage => 30,
        AuditStage::Serp => 55,
        AuditStage::Backlinks => 70,
        AuditStage::Business => 80,
        AuditStage::Competitors => 90,
    }
}

/// 由城市和州拼出的位置描述
fn location_of(audit: &Audit) -> Option<String> {
    let parts: Vec<&str> = [audit.city.as_deref(), audit.state.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// 审计执行器
///
/// 依次运行 onpage → serp → backlinks → business → competitors。
/// 已经写入的阶段在重新投递时会被跳过；onpage 与 serp 失败会使审计失败，
/// 其余阶段失败只记录日志，不写入该阶段结果。
pub struct AuditExecutor<AR, CP, RP, PP> {
    audit_repo: Arc<AR>,
    crawl: Arc<CP>,
    rank: Arc<RP>,
    places: Arc<PP>,
    scorer: ThematicScorer,
    settings: AuditSettings,
}

impl<AR, CP, RP, PP> AuditExecutor<AR, CP, RP, PP>
where
    AR: AuditRepository,
    CP: CrawlProvider,
    RP: RankProvider,
    PP: PlacesProvider,
{
    pub fn new(
        audit_repo: Arc<AR>,
        crawl: Arc<CP>,
        rank: Arc<RP>,
        places: Arc<PP>,
        scorer: ThematicScorer,
        settings: AuditSettings,
    ) -> Self {
        Self {
            audit_repo,
            crawl,
            rank,
            places,
            scorer,
            settings,
        }
    }

    #[instrument(skip(self, audit), fields(audit_id = %audit.id, domain = %audit.domain))]
    async fn run(&self, audit: Audit, skip_cache: bool) -> Result<(), WorkerError> {
        let use_cache = !skip_cache;
        let mut audit = match audit.status {
            AuditStatus::Pending => self.audit_repo.update(&audit.begin_crawl()?).await?,
            _ => audit,
        };

        if audit.status == AuditStatus::Crawling {
            if !audit.step_results.contains(AuditStage::Onpage) {
                match self.onpage(&audit.domain, use_cache).await {
                    Ok(result) => {
                        audit.record_step(StepResult::Onpage(result))?;
                        audit.advance(AuditStage::Onpage, stage_progress(AuditStage::Onpage))?;
                    }
                    Err(e) => return self.fail(audit, AuditStage::Onpage, e).await,
                }
            }
            audit = self.audit_repo.update(&audit.begin_analysis()?).await?;
        }

        for stage in ANALYSIS_STAGES {
            if audit.step_results.contains(stage) {
                continue;
            }
            let outcome = match stage {
                AuditStage::Serp => self.serp(&audit, use_cache).await.map(Some),
                AuditStage::Backlinks => self
                    .rank
                    .backlinks_summary(&audit.domain, use_cache)
                    .await
                    .map(|summary| Some(StepResult::Backlinks(summary))),
                AuditStage::Business => self.business(&audit).await,
                AuditStage::Competitors => self.competitors(&audit, use_cache).await.map(Some),
                AuditStage::Onpage => Ok(None),
            };

            match outcome {
                Ok(Some(result)) => audit.record_step(result)?,
                Ok(None) => {}
                Err(e) if stage == AuditStage::Serp => return self.fail(audit, stage, e).await,
                Err(e) => warn!("Audit {} stage {} skipped: {}", audit.id, stage, e),
            }
            audit.advance(stage, stage_progress(stage))?;
            audit = self.audit_repo.update(&audit).await?;
        }

        let score = audit
            .step_results
            .onpage()
            .map(|onpage| onpage.report.overall_score)
            .unwrap_or(0);
        let audit = self.audit_repo.update(&audit.complete(score)?).await?;
        info!("Audit {} completed with score {}", audit.id, score);
        Ok(())
    }

    async fn fail(&self, audit: Audit, stage: AuditStage, error: ProviderError) -> Result<(), WorkerError> {
        warn!("Audit {} failed at stage {}: {}", audit.id, stage, error);
        self.audit_repo.update(&audit.fail(error.to_string())?).await?;
        Ok(())
    }

    /// 首页即时分析：问题分级与主题评分
    async fn onpage(&self, domain: &str, use_cache: bool) -> Result<OnpageResult, ProviderError> {
        let url = format!("https://{}/", domain);
        let page = self.crawl.instant_page(&url, use_cache).await?;
        let signals = PageSignals::from_crawled(&page);
        let buckets = classify(&signals.checks);
        let report = self.scorer.score(&signals);

        Ok(OnpageResult {
            url: page.url,
            status_code: page.status_code.and_then(|code| u16::try_from(code).ok()),
            errors: buckets.error_ids(),
            warnings: buckets.warning_ids(),
            notices: buckets.notice_ids(),
            passed: buckets.passed.len(),
            checks: signals.checks,
            report,
        })
    }

    fn target_keywords(&self, audit: &Audit) -> Vec<String> {
        if audit.keywords.is_empty() {
            generate_keywords(
                &audit.domain,
                audit.city.as_deref(),
                audit.state.as_deref(),
                MAX_KEYWORDS,
            )
        } else {
            audit.keywords.clone()
        }
    }

    async fn serp(&self, audit: &Audit, use_cache: bool) -> Result<StepResult, ProviderError> {
        let location = location_of(audit);
        let keywords = self.target_keywords(audit);
        let positions = if keywords.is_empty() {
            Vec::new()
        } else {
            self.rank
                .keyword_rankings(&RankQuery {
                    domain: audit.domain.clone(),
                    keywords,
                    location: location.clone(),
                    use_cache,
                })
                .await?
        };
        Ok(StepResult::Serp(SerpResult {
            location,
            keywords: positions,
        }))
    }

    async fn business(&self, audit: &Audit) -> Result<Option<StepResult>, ProviderError> {
        let Some(name) = audit.business_name.as_deref().filter(|n| !n.trim().is_empty()) else {
            return Ok(None);
        };
        let location = audit.business_location.clone().or_else(|| location_of(audit));
        let profile = self.places.find_business(name, location).await?;
        if profile.is_none() {
            info!("Business '{}' not found for audit {}", name, audit.id);
        }
        Ok(profile.map(StepResult::Business))
    }

    /// 竞争对手快照
    ///
    /// 用户提供的列表优先，否则向排名服务发现；单个竞争对手的查询失败
    /// 只会让该快照缺少对应数据。
    async fn competitors(&self, audit: &Audit, use_cache: bool) -> Result<StepResult, ProviderError> {
        let max = self.settings.max_competitors;
        let location = location_of(audit);
        let (domains, discovered) = if audit.competitors.is_empty() {
            let found = self
                .rank
                .competitor_domains(&audit.domain, location.clone(), max as u32)
                .await?;
            let mut domains: Vec<String> = Vec::new();
            for domain in found {
                let domain = domain.trim().to_lowercase();
                if !domain.is_empty() && domain != audit.domain && !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
            (domains, true)
        } else {
            (audit.competitors.clone(), false)
        };

        let keywords: Vec<String> = match audit.step_results.serp() {
            Some(serp) => serp.keywords.iter().map(|k| k.keyword.clone()).collect(),
            None => self.target_keywords(audit),
        };

        let mut snapshots = Vec::new();
        for domain in domains.into_iter().take(max) {
            let positions = if keywords.is_empty() {
                Vec::new()
            } else {
                let query = RankQuery {
                    domain: domain.clone(),
                    keywords: keywords.clone(),
                    location: location.clone(),
                    use_cache,
                };
                self.rank.keyword_rankings(&query).await.unwrap_or_else(|e| {
                    warn!("Keyword rankings for competitor {} unavailable: {}", domain, e);
                    Vec::new()
                })
            };
            let backlinks = match self.rank.backlinks_summary(&domain, use_cache).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("Backlinks for competitor {} unavailable: {}", domain, e);
                    None
                }
            };
            snapshots.push(CompetitorSnapshot {
                domain,
                keywords: positions,
                backlinks,
            });
        }

        Ok(StepResult::Competitors(CompetitorsResult {
            discovered,
            competitors: snapshots,
        }))
    }
}

#[async_trait]
impl<AR, CP, RP, PP> JobHandler for AuditExecutor<AR, CP, RP, PP>
where
    AR: AuditRepository,
    CP: CrawlProvider,
    RP: RankProvider,
    PP: PlacesProvider,
{
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn handle(&self, job: &Job) -> Result<(), WorkerError> {
        let payload: AuditJobPayload = job.payload_as()?;
        let Some(audit) = self.audit_repo.find_by_id(payload.audit_id).await? else {
            warn!("Audit {} no longer exists, dropping job", payload.audit_id);
            return Ok(());
        };
        if audit.status.is_terminal() {
            info!("Audit {} already {}, nothing to do", audit.id, audit.status);
            return Ok(());
        }
        self.run(audit, payload.skip_cache).await
    }

    async fn abandon(&self, job: &Job, reason: &str) -> Result<(), WorkerError> {
        let payload: AuditJobPayload = job.payload_as()?;
        if let Some(audit) = self.audit_repo.find_by_id(payload.audit_id).await? {
            if !audit.status.is_terminal() {
                self.audit_repo.update(&audit.fail(reason)?).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "audit_executor_test.rs"]
mod tests;
