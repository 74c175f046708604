// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// 扫描页面，`(scan_id, url_hash)` 上有唯一索引
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_pages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub scan_id: Uuid,
    pub url: String,
    pub url_hash: String,
    pub status_code: Option<i32>,
    pub score: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub h1: Json,
    pub word_count: Option<i32>,
    pub redirect_url: Option<String>,
    pub internal_links: Option<i32>,
    pub external_links: Option<i32>,
    pub timing: Json,
    pub checks: Json,
    pub issue_types: Json,
    pub issue_count: i32,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
