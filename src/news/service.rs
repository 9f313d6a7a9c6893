// src/news/service.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::{rank, trending, RankedArticle, RawArticle, TrendingTopic};
use crate::config::UpstreamConfig;
use crate::retry::{fetch_with_retry, FetchError, HttpTransport, RetryExecutor};

/// Default attempt budget for NewsAPI calls (three attempts in total).
/// Overridden by the retry policy file.
pub const NEWS_MAX_RETRIES: u32 = 2;
/// Page size used to compute trending topics.
pub const TRENDING_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub country: String,
    pub category: String,
    pub page_size: usize,
    pub language: String,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            country: "rw".to_string(),
            category: "health".to_string(),
            page_size: 10,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    pub success: bool,
    pub data: Vec<RankedArticle>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_mock_data: bool,
}

impl NewsFeed {
    fn new(mut data: Vec<RankedArticle>, page_size: usize, now: DateTime<Utc>, mock: bool) -> Self {
        data.truncate(page_size);
        Self {
            success: true,
            count: data.len(),
            data,
            timestamp: now,
            is_mock_data: mock,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFeed {
    pub success: bool,
    pub data: Vec<RankedArticle>,
    pub category: String,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingFeed {
    pub success: bool,
    pub data: Vec<TrendingTopic>,
    pub timestamp: DateTime<Utc>,
}

// --- NewsAPI wire format ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: Option<ApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

impl From<ApiArticle> for RawArticle {
    fn from(a: ApiArticle) -> Self {
        Self {
            title: a.title,
            description: a.description,
            url: a.url,
            source_name: a.source.and_then(|s| s.name),
            published_at: a
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            url_to_image: a.url_to_image,
        }
    }
}

/// NewsAPI client that ranks what it fetches and falls back to bundled
/// stories when the API is unconfigured or failing.
pub struct NewsService {
    transport: Arc<dyn HttpTransport>,
    upstream: UpstreamConfig,
    executor: RetryExecutor,
    timeout: Duration,
}

impl NewsService {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        upstream: UpstreamConfig,
        executor: RetryExecutor,
        timeout: Duration,
    ) -> Self {
        let executor = executor.with_max_retries(upstream.max_retries);
        Self {
            transport,
            upstream,
            executor,
            timeout,
        }
    }

    pub async fn health_news(&self, query: &NewsQuery) -> NewsFeed {
        let now = Utc::now();
        let Some(api_key) = self.upstream.api_key.as_deref() else {
            tracing::warn!("News API key not configured, using mock data");
            return mock_feed(now, query.page_size);
        };

        match self.fetch_articles(api_key, query).await {
            Ok(raw) => {
                let ranked = rank(&raw, now);
                counter!("news_articles_ranked_total").increment(ranked.len() as u64);
                counter!("news_articles_dropped_total")
                    .increment((raw.len() - ranked.len()) as u64);
                tracing::info!(
                    articles = ranked.len(),
                    country = %query.country,
                    category = %query.category,
                    "health news fetched"
                );
                NewsFeed::new(ranked, query.page_size, now, false)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    country = %query.country,
                    category = %query.category,
                    "failed to fetch health news, using mock data"
                );
                counter!("upstream_fallback_total", "service" => "news").increment(1);
                mock_feed(now, query.page_size)
            }
        }
    }

    /// Articles whose category label, title or description mention `category`.
    pub async fn health_news_by_category(&self, category: &str, query: &NewsQuery) -> CategoryFeed {
        let feed = self.health_news(query).await;
        let data = filter_by_category(feed.data, category);
        CategoryFeed {
            success: true,
            count: data.len(),
            data,
            category: category.to_string(),
            timestamp: feed.timestamp,
        }
    }

    pub async fn trending_topics(&self) -> TrendingFeed {
        let query = NewsQuery {
            page_size: TRENDING_PAGE_SIZE,
            ..NewsQuery::default()
        };
        let feed = self.health_news(&query).await;
        TrendingFeed {
            success: true,
            data: trending(&feed.data),
            timestamp: feed.timestamp,
        }
    }

    async fn fetch_articles(
        &self,
        api_key: &str,
        query: &NewsQuery,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let page_size = query.page_size.to_string();

        let url = self.url(
            "top-headlines",
            &[
                ("country", query.country.as_str()),
                ("category", query.category.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ],
        )?;
        let mut body: ApiResponse = self.get_json(&url).await?;

        // Nothing country-specific: widen to regional health coverage.
        if body.articles.is_empty() {
            let url = self.url(
                "everything",
                &[
                    ("q", "health AND (Rwanda OR Africa)"),
                    ("language", query.language.as_str()),
                    ("pageSize", page_size.as_str()),
                    ("sortBy", "publishedAt"),
                    ("apiKey", api_key),
                ],
            )?;
            body = self.get_json(&url).await?;
        }

        if body.status.as_deref() == Some("error") {
            return Err(FetchError::permanent(
                body.message.unwrap_or_else(|| "News API error".to_string()),
            ));
        }

        Ok(body.articles.into_iter().map(RawArticle::from).collect())
    }

    async fn get_json(&self, url: &str) -> Result<ApiResponse, FetchError> {
        fetch_with_retry(self.transport.as_ref(), url, self.timeout, &self.executor)
            .await?
            .json()
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let base = self.upstream.base_url.trim_end_matches('/');
        reqwest::Url::parse_with_params(&format!("{base}/{endpoint}"), params)
            .map(String::from)
            .map_err(|e| FetchError::permanent(format!("invalid news url: {e}")))
    }
}

pub fn filter_by_category(articles: Vec<RankedArticle>, category: &str) -> Vec<RankedArticle> {
    let needle = category.to_lowercase();
    articles
        .into_iter()
        .filter(|a| {
            a.category.label().to_lowercase().contains(&needle)
                || a.title.to_lowercase().contains(&needle)
                || a.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Bundled Rwanda health stories, ranked like live data.
pub fn mock_articles(now: DateTime<Utc>) -> Vec<RawArticle> {
    let stories: [(&str, &str, &str, &str, i64); 5] = [
        (
            "Rwanda Launches New Malaria Prevention Campaign",
            "The Ministry of Health announces a comprehensive malaria prevention program targeting high-risk areas across Rwanda.",
            "https://example.com/malaria-campaign",
            "Rwanda Health Ministry",
            2,
        ),
        (
            "COVID-19 Vaccination Drive Reaches Rural Communities",
            "Mobile vaccination units are bringing COVID-19 vaccines to remote areas of Rwanda, improving accessibility for all citizens.",
            "https://example.com/covid-vaccination",
            "Rwanda Biomedical Centre",
            6,
        ),
        (
            "Maternal Health Services Expanded in Eastern Province",
            "New maternal health centers are being established to reduce maternal mortality rates and improve prenatal care.",
            "https://example.com/maternal-health",
            "Rwanda Health News",
            12,
        ),
        (
            "Digital Health Records System Improves Patient Care",
            "Rwanda's new electronic health records system is streamlining patient care and improving health outcomes nationwide.",
            "https://example.com/digital-health",
            "Health Tech Rwanda",
            24,
        ),
        (
            "Nutrition Program Targets Child Malnutrition",
            "A new government initiative aims to reduce child malnutrition rates through community-based nutrition programs.",
            "https://example.com/nutrition-program",
            "UNICEF Rwanda",
            36,
        ),
    ];

    stories
        .into_iter()
        .map(|(title, description, url, source, hours_ago)| RawArticle {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            url: Some(url.to_string()),
            source_name: Some(source.to_string()),
            published_at: Some(now - chrono::Duration::hours(hours_ago)),
            url_to_image: None,
        })
        .collect()
}

fn mock_feed(now: DateTime<Utc>, page_size: usize) -> NewsFeed {
    tracing::info!("using mock health news data");
    NewsFeed::new(rank(&mock_articles(now), now), page_size, now, true)
}
