// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_summaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scan_id: Uuid,
    pub total_pages: i32,
    pub crawled_pages: i32,
    pub crawl_stop_reason: Option<String>,
    pub errors_count: i32,
    pub warnings_count: i32,
    pub notices_count: i32,
    pub avg_lcp: Option<f64>,
    pub avg_cls: Option<f64>,
    pub images_count: i32,
    pub internal_links_count: i32,
    pub external_links_count: i32,
    pub redirects_count: i32,
    pub duplicate_titles: i32,
    pub duplicate_descriptions: i32,
    pub duplicate_content: i32,
    pub domain_info: Json,
    pub ssl_info: Json,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
