// src/news/ranker.rs
//! Pure ranking pipeline: filter → identify → score → categorize → stable sort.
//! Output depends only on the input slice and `now`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};

use super::keywords::{CATEGORY_RULES, RECENCY_BUCKETS, SCORING_SETS};
use super::{
    HealthCategory, RankedArticle, RawArticle, TrendingTopic, DEFAULT_DESCRIPTION,
    REMOVED_SENTINEL, TRENDING_LIMIT, UNKNOWN_SOURCE,
};

const ID_LEN: usize = 16;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Rank raw articles, highest relevance first. Ties keep input order.
pub fn rank(raw: &[RawArticle], now: DateTime<Utc>) -> Vec<RankedArticle> {
    let mut out: Vec<RankedArticle> = raw.iter().filter_map(|a| to_ranked(a, now)).collect();
    // `sort_by` is stable.
    out.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    out
}

fn to_ranked(a: &RawArticle, now: DateTime<Utc>) -> Option<RankedArticle> {
    let title = displayable_title(a)?;
    let description = a.description.as_deref().unwrap_or_default();
    let source = a.source_name.as_deref().unwrap_or_default();

    Some(RankedArticle {
        id: article_id(title, source),
        title: title.to_string(),
        description: if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description.to_string()
        },
        url: a.url.clone(),
        source: if source.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            source.to_string()
        },
        published_at: a.published_at,
        url_to_image: a.url_to_image.clone(),
        relevance_score: relevance_score(title, description, a.published_at, now),
        category: categorize(title, description),
    })
}

fn displayable_title(a: &RawArticle) -> Option<&str> {
    a.title
        .as_deref()
        .filter(|t| !t.is_empty() && *t != REMOVED_SENTINEL)
}

/// First 16 chars of base64(`"{title}-{source}"`). Advisory; collisions allowed.
pub fn article_id(title: &str, source: &str) -> String {
    let encoded = STANDARD.encode(format!("{title}-{source}"));
    encoded.chars().take(ID_LEN).collect()
}

fn haystack(title: &str, description: &str) -> String {
    format!("{title} {description}").to_lowercase()
}

/// Keyword weights plus recency bonus. Unbounded: every matching keyword adds.
pub fn relevance_score(
    title: &str,
    description: &str,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    keyword_score(&haystack(title, description)) + recency_bonus(published_at, now)
}

/// `text` must already be lowercase.
pub fn keyword_score(text: &str) -> i64 {
    SCORING_SETS
        .iter()
        .map(|set| {
            let hits = set.keywords.iter().filter(|kw| text.contains(**kw)).count();
            set.weight * hits as i64
        })
        .sum()
}

/// Bonus of the freshest bucket the article fits; unknown dates earn nothing.
pub fn recency_bonus(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(published) = published_at else {
        return 0;
    };
    let age_days = (now - published).num_milliseconds() as f64 / MS_PER_DAY;
    RECENCY_BUCKETS
        .iter()
        .find(|b| age_days <= b.max_age_days)
        .map_or(0, |b| b.bonus)
}

pub fn categorize(title: &str, description: &str) -> HealthCategory {
    let text = haystack(title, description);
    CATEGORY_RULES
        .iter()
        .find(|(kws, _)| kws.iter().any(|kw| text.contains(kw)))
        .map_or(HealthCategory::General, |(_, cat)| *cat)
}

/// Category frequencies, most frequent first, at most `TRENDING_LIMIT`.
/// Equal counts keep first-seen order.
pub fn trending(articles: &[RankedArticle]) -> Vec<TrendingTopic> {
    let mut topics: Vec<TrendingTopic> = Vec::new();
    for a in articles {
        match topics.iter_mut().find(|t| t.category == a.category) {
            Some(t) => t.count += 1,
            None => topics.push(TrendingTopic {
                category: a.category,
                count: 1,
            }),
        }
    }
    topics.sort_by(|a, b| b.count.cmp(&a.count));
    topics.truncate(TRENDING_LIMIT);
    topics
}
