// src/news/mod.rs
//! Health news: article model, keyword tables, the deterministic ranker and
//! the NewsAPI-backed service that feeds it.

pub mod keywords;
pub mod ranker;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use ranker::{article_id, categorize, rank, relevance_score, trending};
pub use service::{NewsFeed, NewsQuery, NewsService};

/// Title used by NewsAPI for articles withdrawn by their publisher.
pub const REMOVED_SENTINEL: &str = "[Removed]";
pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const UNKNOWN_SOURCE: &str = "Unknown Source";
/// Maximum number of entries returned by `trending`.
pub const TRENDING_LIMIT: usize = 10;

/// Article as received from the upstream fetcher; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub url_to_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthCategory {
    #[serde(rename = "Malaria & Vector Control")]
    Malaria,
    #[serde(rename = "COVID-19")]
    Covid19,
    #[serde(rename = "Vaccination")]
    Vaccination,
    #[serde(rename = "Maternal Health")]
    MaternalHealth,
    #[serde(rename = "Child Health")]
    ChildHealth,
    #[serde(rename = "Nutrition")]
    Nutrition,
    #[serde(rename = "Mental Health")]
    MentalHealth,
    #[serde(rename = "HIV/AIDS")]
    HivAids,
    #[serde(rename = "Cancer")]
    Cancer,
    #[serde(rename = "Non-Communicable Diseases")]
    NonCommunicable,
    #[serde(rename = "General Health")]
    General,
}

impl HealthCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Malaria => "Malaria & Vector Control",
            Self::Covid19 => "COVID-19",
            Self::Vaccination => "Vaccination",
            Self::MaternalHealth => "Maternal Health",
            Self::ChildHealth => "Child Health",
            Self::Nutrition => "Nutrition",
            Self::MentalHealth => "Mental Health",
            Self::HivAids => "HIV/AIDS",
            Self::Cancer => "Cancer",
            Self::NonCommunicable => "Non-Communicable Diseases",
            Self::General => "General Health",
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored, categorized article. Built once by the ranker, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url_to_image: Option<String>,
    pub relevance_score: i64,
    #[serde(rename = "healthCategory")]
    pub category: HealthCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub category: HealthCategory,
    pub count: usize,
}
