// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 技术检查项分级
//!
//! 将页面分析返回的布尔检查项划分为错误、警告、提示和通过四类。
//! 分级依据两张静态表：检查项元数据（展示标签与极性）以及
//! 严重程度分级表。只有出现在分级表中的检查项才会参与分类。

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Notice => write!(f, "notice"),
        }
    }
}

/// 检查项定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckDefinition {
    pub id: &'static str,
    pub label: &'static str,
    /// 为 true 时检查值为 true 即表示失败
    pub fails_when_true: bool,
}

impl CheckDefinition {
    /// 判断给定值是否表示失败
    pub fn fails(&self, value: bool) -> bool {
        if self.fails_when_true {
            value
        } else {
            !value
        }
    }
}

const fn def(id: &'static str, label: &'static str, fails_when_true: bool) -> CheckDefinition {
    CheckDefinition {
        id,
        label,
        fails_when_true,
    }
}

/// 检查项元数据表
const CHECK_DEFINITIONS: &[CheckDefinition] = &[
    def("is_broken", "Broken page", true),
    def("is_4xx_code", "4xx client error", true),
    def("is_5xx_code", "5xx server error", true),
    def("no_title", "Missing title tag", true),
    def("no_h1_tag", "Missing H1 heading", true),
    def("is_https", "Served over HTTPS", false),
    def("https_to_http_links", "HTTPS page links to HTTP", true),
    def("canonical_to_broken", "Canonical points to a broken page", true),
    def("redirect_loop", "Redirect loop", true),
    def("no_description", "Missing meta description", true),
    def("title_too_long", "Title too long", true),
    def("title_too_short", "Title too short", true),
    def("no_image_alt", "Images without alt text", true),
    def("high_loading_time", "Slow page load", true),
    def("high_waiting_time", "Slow server response", true),
    def("large_page_size", "Large page size", true),
    def("duplicate_title_tag", "Duplicate title tag", true),
    def("duplicate_description", "Duplicate meta description", true),
    def("low_content_rate", "Low text to HTML ratio", true),
    def("has_render_blocking_resources", "Render-blocking resources", true),
    def("redirect_chain", "Redirect chain", true),
    def("canonical", "Canonical tag present", false),
    def("has_links_to_redirects", "Links to redirects", true),
    def("no_content_encoding", "No content compression", true),
    def("lorem_ipsum", "Placeholder text", true),
    def("no_favicon", "Missing favicon", true),
    def("has_html_doctype", "HTML doctype declared", false),
    def("seo_friendly_url", "SEO-friendly URL", false),
    def("no_image_title", "Images without title attribute", true),
    def("is_orphan_page", "Orphan page", true),
    def("has_micromarkup", "Structured data present", false),
    def("deprecated_html_tags", "Deprecated HTML tags", true),
    def("has_meta_refresh_redirect", "Meta refresh redirect", true),
    def("low_character_count", "Low character count", true),
    def("is_www", "WWW host", true),
    def("is_redirect", "Redirect", true),
    def("small_page_size", "Small page size", true),
    def("frame", "Uses frames", true),
    def("flash", "Uses Flash", true),
];

const ERROR_CHECKS: &[&str] = &[
    "is_broken",
    "is_4xx_code",
    "is_5xx_code",
    "no_title",
    "no_h1_tag",
    "is_https",
    "https_to_http_links",
    "canonical_to_broken",
    "redirect_loop",
];

const WARNING_CHECKS: &[&str] = &[
    "no_description",
    "title_too_long",
    "title_too_short",
    "no_image_alt",
    "high_loading_time",
    "high_waiting_time",
    "large_page_size",
    "duplicate_title_tag",
    "duplicate_description",
    "low_content_rate",
    "has_render_blocking_resources",
    "redirect_chain",
    "canonical",
    "has_links_to_redirects",
    "no_content_encoding",
    "lorem_ipsum",
];

const NOTICE_CHECKS: &[&str] = &[
    "no_favicon",
    "has_html_doctype",
    "seo_friendly_url",
    "no_image_title",
    "is_orphan_page",
    "has_micromarkup",
    "deprecated_html_tags",
    "has_meta_refresh_redirect",
    "low_character_count",
];

static METADATA: Lazy<HashMap<&'static str, CheckDefinition>> =
    Lazy::new(|| CHECK_DEFINITIONS.iter().map(|d| (d.id, *d)).collect());

static SEVERITY: Lazy<HashMap<&'static str, Severity>> = Lazy::new(|| {
    let mut tiers = HashMap::new();
    for (checks, severity) in [
        (ERROR_CHECKS, Severity::Error),
        (WARNING_CHECKS, Severity::Warning),
        (NOTICE_CHECKS, Severity::Notice),
    ] {
        for id in checks {
            tiers.insert(*id, severity);
        }
    }
    tiers
});

/// 查找检查项定义
pub fn definition(id: &str) -> Option<&'static CheckDefinition> {
    METADATA.get(id)
}

/// 查找检查项的严重程度
pub fn severity_of(id: &str) -> Option<Severity> {
    SEVERITY.get(id).copied()
}

/// 分类结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueBuckets {
    pub errors: Vec<CheckDefinition>,
    pub warnings: Vec<CheckDefinition>,
    pub notices: Vec<CheckDefinition>,
    pub passed: Vec<CheckDefinition>,
}

impl IssueBuckets {
    /// 参与分类的检查项总数
    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.notices.len() + self.passed.len()
    }

    pub fn error_ids(&self) -> Vec<String> {
        ids(&self.errors)
    }

    pub fn warning_ids(&self) -> Vec<String> {
        ids(&self.warnings)
    }

    pub fn notice_ids(&self) -> Vec<String> {
        ids(&self.notices)
    }
}

fn ids(defs: &[CheckDefinition]) -> Vec<String> {
    defs.iter().map(|d| d.id.to_string()).collect()
}

/// 对一组布尔检查项进行分类
///
/// 未知检查项被忽略，没有配置严重程度的检查项不计入任何分类。
/// 失败的检查项进入其严重程度对应的分类，通过的检查项一律进入 `passed`。
pub fn classify(checks: &BTreeMap<String, bool>) -> IssueBuckets {
    let mut buckets = IssueBuckets::default();
    for (name, value) in checks {
        let Some(def) = definition(name) else {
            continue;
        };
        let Some(severity) = severity_of(name) else {
            continue;
        };
        if !def.fails(*value) {
            buckets.passed.push(*def);
            continue;
        }
        match severity {
            Severity::Error => buckets.errors.push(*def),
            Severity::Warning => buckets.warnings.push(*def),
            Severity::Notice => buckets.notices.push(*def),
        }
    }
    buckets
}
