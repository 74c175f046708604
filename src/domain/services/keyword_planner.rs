// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 单次审计最多跟踪的关键词数量
pub const MAX_KEYWORDS: usize = 20;

/// 清理用户提供的关键词：去空白、小写、去重，保留原始顺序
pub fn normalize_keywords(keywords: &[String], max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        let cleaned = keyword.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if cleaned.is_empty() || out.contains(&cleaned) {
            continue;
        }
        out.push(cleaned);
        if out.len() >= max {
            break;
        }
    }
    out
}

/// 域名的主标签，转换为可读短语
///
/// `www.example-dental.com` → `example dental`
pub fn domain_phrase(domain: &str) -> String {
    let label = domain
        .split('.')
        .find(|part| !part.is_empty() && *part != "www")
        .unwrap_or(domain);
    label
        .split(['-', '_'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 在用户没有提供关键词时，根据域名与所在地生成候选关键词
pub fn generate_keywords(domain: &str, city: Option<&str>, state: Option<&str>, max: usize) -> Vec<String> {
    let phrase = domain_phrase(domain);
    if phrase.is_empty() {
        return Vec::new();
    }
    let city = city.map(str::trim).filter(|c| !c.is_empty());
    let state = state.map(str::trim).filter(|s| !s.is_empty());

    let mut candidates = vec![phrase.clone()];
    match (city, state) {
        (Some(city), Some(state)) => {
            candidates.push(format!("{phrase} {city}"));
            candidates.push(format!("{phrase} {city} {state}"));
            candidates.push(format!("{phrase} in {city}"));
            candidates.push(format!("best {phrase} {city}"));
            candidates.push(format!("{phrase} {state}"));
        }
        (Some(city), None) => {
            candidates.push(format!("{phrase} {city}"));
            candidates.push(format!("{phrase} in {city}"));
            candidates.push(format!("best {phrase} {city}"));
        }
        (None, Some(state)) => {
            candidates.push(format!("{phrase} {state}"));
        }
        (None, None) => {}
    }
    candidates.push(format!("{phrase} near me"));
    normalize_keywords(&candidates, max)
}
