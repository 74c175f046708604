// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 审计、全站扫描、地理网格与任务表
#[derive(DeriveMigrationName)]
pub struct Migration;

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. audits
        manager
            .create_table(
                Table::create()
                    .table(Audits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Audits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Audits::UserId).uuid().not_null())
                    .col(ColumnDef::new(Audits::Domain).string().not_null())
                    .col(ColumnDef::new(Audits::Status).string().not_null())
                    .col(ColumnDef::new(Audits::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(Audits::CurrentStep).string().null())
                    .col(ColumnDef::new(Audits::ErrorMessage).text().null())
                    .col(ColumnDef::new(Audits::City).string().null())
                    .col(ColumnDef::new(Audits::State).string().null())
                    .col(ColumnDef::new(Audits::BusinessName).string().null())
                    .col(ColumnDef::new(Audits::BusinessLocation).string().null())
                    .col(ColumnDef::new(Audits::PlaceId).string().null())
                    .col(ColumnDef::new(Audits::Keywords).json().not_null())
                    .col(ColumnDef::new(Audits::Competitors).json().not_null())
                    .col(ColumnDef::new(Audits::StepResults).json().not_null())
                    .col(ColumnDef::new(Audits::Score).integer().null())
                    .col(created_at(Audits::CreatedAt))
                    .col(created_at(Audits::UpdatedAt))
                    .col(ColumnDef::new(Audits::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Audits::CompletedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audits_user_domain_created")
                    .table(Audits::Table)
                    .col(Audits::UserId)
                    .col(Audits::Domain)
                    .col(Audits::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audits_status_updated")
                    .table(Audits::Table)
                    .col(Audits::Status)
                    .col(Audits::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        // 2. site_audit_scans
        manager
            .create_table(
                Table::create()
                    .table(SiteAuditScans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SiteAuditScans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SiteAuditScans::UserId).uuid().not_null())
                    .col(ColumnDef::new(SiteAuditScans::Domain).string().not_null())
                    .col(ColumnDef::new(SiteAuditScans::Status).string().not_null())
                    .col(ColumnDef::new(SiteAuditScans::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(SiteAuditScans::TaskId).string().null())
                    .col(ColumnDef::new(SiteAuditScans::Config).json().not_null())
                    .col(ColumnDef::new(SiteAuditScans::AuditId).uuid().null())
                    .col(ColumnDef::new(SiteAuditScans::DomainEntityId).uuid().null())
                    .col(ColumnDef::new(SiteAuditScans::Cost).double().null())
                    .col(ColumnDef::new(SiteAuditScans::ErrorMessage).text().null())
                    .col(created_at(SiteAuditScans::CreatedAt))
                    .col(created_at(SiteAuditScans::UpdatedAt))
                    .col(ColumnDef::new(SiteAuditScans::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(SiteAuditScans::CompletedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_site_audit_scans_user")
                    .table(SiteAuditScans::Table)
                    .col(SiteAuditScans::UserId)
                    .col(SiteAuditScans::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_site_audit_scans_status_updated")
                    .table(SiteAuditScans::Table)
                    .col(SiteAuditScans::Status)
                    .col(SiteAuditScans::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        // 3. scan_summaries，每个扫描至多一条
        manager
            .create_table(
                Table::create()
                    .table(ScanSummaries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScanSummaries::ScanId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScanSummaries::TotalPages).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::CrawledPages).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::CrawlStopReason).string().null())
                    .col(ColumnDef::new(ScanSummaries::ErrorsCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::WarningsCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::NoticesCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::AvgLcp).double().null())
                    .col(ColumnDef::new(ScanSummaries::AvgCls).double().null())
                    .col(ColumnDef::new(ScanSummaries::ImagesCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::InternalLinksCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::ExternalLinksCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::RedirectsCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::DuplicateTitles).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::DuplicateDescriptions).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::DuplicateContent).integer().not_null().default(0))
                    .col(ColumnDef::new(ScanSummaries::DomainInfo).json().not_null())
                    .col(ColumnDef::new(ScanSummaries::SslInfo).json().not_null())
                    .col(created_at(ScanSummaries::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // 4. scan_pages
        manager
            .create_table(
                Table::create()
                    .table(ScanPages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScanPages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScanPages::ScanId).uuid().not_null())
                    .col(ColumnDef::new(ScanPages::Url).text().not_null())
                    .col(ColumnDef::new(ScanPages::UrlHash).string_len(64).not_null())
                    .col(ColumnDef::new(ScanPages::StatusCode).integer().null())
                    .col(ColumnDef::new(ScanPages::Score).double().null())
                    .col(ColumnDef::new(ScanPages::Title).text().null())
                    .col(ColumnDef::new(ScanPages::Description).text().null())
                    .col(ColumnDef::new(ScanPages::H1).json().not_null())
                    .col(ColumnDef::new(ScanPages::WordCount).integer().null())
                    .col(ColumnDef::new(ScanPages::RedirectUrl).text().null())
                    .col(ColumnDef::new(ScanPages::InternalLinks).integer().null())
                    .col(ColumnDef::new(ScanPages::ExternalLinks).integer().null())
                    .col(ColumnDef::new(ScanPages::Timing).json().not_null())
                    .col(ColumnDef::new(ScanPages::Checks).json().not_null())
                    .col(ColumnDef::new(ScanPages::IssueTypes).json().not_null())
                    .col(ColumnDef::new(ScanPages::IssueCount).integer().not_null().default(0))
                    .col(created_at(ScanPages::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_scan_pages_scan_url_hash")
                    .table(ScanPages::Table)
                    .col(ScanPages::ScanId)
                    .col(ScanPages::UrlHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 5. geo_grid_scans
        manager
            .create_table(
                Table::create()
                    .table(GeoGridScans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GeoGridScans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GeoGridScans::UserId).uuid().not_null())
                    .col(ColumnDef::new(GeoGridScans::CampaignId).uuid().not_null())
                    .col(ColumnDef::new(GeoGridScans::BusinessName).string().not_null())
                    .col(ColumnDef::new(GeoGridScans::PlaceId).string().null())
                    .col(ColumnDef::new(GeoGridScans::CenterLat).double().not_null())
                    .col(ColumnDef::new(GeoGridScans::CenterLng).double().not_null())
                    .col(ColumnDef::new(GeoGridScans::GridSize).integer().not_null())
                    .col(ColumnDef::new(GeoGridScans::RadiusKm).double().not_null())
                    .col(ColumnDef::new(GeoGridScans::Keywords).json().not_null())
                    .col(ColumnDef::new(GeoGridScans::Status).string().not_null())
                    .col(ColumnDef::new(GeoGridScans::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(GeoGridScans::ErrorMessage).text().null())
                    .col(created_at(GeoGridScans::CreatedAt))
                    .col(created_at(GeoGridScans::UpdatedAt))
                    .col(ColumnDef::new(GeoGridScans::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(GeoGridScans::CompletedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_geo_grid_scans_campaign_status")
                    .table(GeoGridScans::Table)
                    .col(GeoGridScans::CampaignId)
                    .col(GeoGridScans::Status)
                    .col(GeoGridScans::CompletedAt)
                    .to_owned(),
            )
            .await?;

        // 6. geo_grid_points
        manager
            .create_table(
                Table::create()
                    .table(GeoGridPoints::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GeoGridPoints::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GeoGridPoints::ScanId).uuid().not_null())
                    .col(ColumnDef::new(GeoGridPoints::RowIndex).integer().not_null())
                    .col(ColumnDef::new(GeoGridPoints::ColIndex).integer().not_null())
                    .col(ColumnDef::new(GeoGridPoints::Lat).double().not_null())
                    .col(ColumnDef::new(GeoGridPoints::Lng).double().not_null())
                    .col(ColumnDef::new(GeoGridPoints::Rankings).json().not_null())
                    .col(created_at(GeoGridPoints::SampledAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_geo_grid_points_scan_cell")
                    .table(GeoGridPoints::Table)
                    .col(GeoGridPoints::ScanId)
                    .col(GeoGridPoints::RowIndex)
                    .col(GeoGridPoints::ColIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 7. jobs
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jobs::JobType).string().not_null())
                    .col(ColumnDef::new(Jobs::Status).string().not_null())
                    .col(ColumnDef::new(Jobs::Payload).json().not_null())
                    .col(ColumnDef::new(Jobs::AttemptCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Jobs::MaxRetries).integer().not_null().default(3))
                    .col(ColumnDef::new(Jobs::ScheduledAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Jobs::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Jobs::CompletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Jobs::LockToken).uuid().null())
                    .col(ColumnDef::new(Jobs::LockExpiresAt).timestamp_with_time_zone().null())
                    .col(created_at(Jobs::CreatedAt))
                    .col(created_at(Jobs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_status_scheduled_created")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .col(Jobs::ScheduledAt)
                    .col(Jobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GeoGridPoints::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GeoGridScans::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScanPages::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScanSummaries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SiteAuditScans::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Audits::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Audits {
    Table,
    Id,
    UserId,
    Domain,
    Status,
    Progress,
    CurrentStep,
    ErrorMessage,
    City,
    State,
    BusinessName,
    BusinessLocation,
    PlaceId,
    Keywords,
    Competitors,
    StepResults,
    Score,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum SiteAuditScans {
    Table,
    Id,
    UserId,
    Domain,
    Status,
    Progress,
    TaskId,
    Config,
    AuditId,
    DomainEntityId,
    Cost,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum ScanSummaries {
    Table,
    ScanId,
    TotalPages,
    CrawledPages,
    CrawlStopReason,
    ErrorsCount,
    WarningsCount,
    NoticesCount,
    AvgLcp,
    AvgCls,
    ImagesCount,
    InternalLinksCount,
    ExternalLinksCount,
    RedirectsCount,
    DuplicateTitles,
    DuplicateDescriptions,
    DuplicateContent,
    DomainInfo,
    SslInfo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScanPages {
    Table,
    Id,
    ScanId,
    Url,
    UrlHash,
    StatusCode,
    Score,
    Title,
    Description,
    H1,
    WordCount,
    RedirectUrl,
    InternalLinks,
    ExternalLinks,
    Timing,
    Checks,
    IssueTypes,
    IssueCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GeoGridScans {
    Table,
    Id,
    UserId,
    CampaignId,
    BusinessName,
    PlaceId,
    CenterLat,
    CenterLng,
    GridSize,
    RadiusKm,
    Keywords,
    Status,
    Progress,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum GeoGridPoints {
    Table,
    Id,
    ScanId,
    RowIndex,
    ColIndex,
    Lat,
    Lng,
    Rankings,
    SampledAt,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    JobType,
    Status,
    Payload,
    AttemptCount,
    MaxRetries,
    ScheduledAt,
    StartedAt,
    CompletedAt,
    LockToken,
    LockExpiresAt,
    CreatedAt,
    UpdatedAt,
}
