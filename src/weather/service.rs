// src/weather/service.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::{district_coordinates, health_recommendations, HealthRecommendation, WeatherReport};
use crate::config::UpstreamConfig;
use crate::retry::{fetch_with_retry, FetchError, HttpTransport, RetryExecutor};

/// Default attempt budget for OpenWeatherMap calls (three attempts in total).
/// Overridden by the retry policy file.
pub const WEATHER_MAX_RETRIES: u32 = 2;

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: Option<OwmWind>,
    /// Metres.
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u32,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherTips {
    pub weather: WeatherReport,
    pub health_recommendations: Vec<HealthRecommendation>,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

pub struct WeatherService {
    transport: Arc<dyn HttpTransport>,
    upstream: UpstreamConfig,
    executor: RetryExecutor,
    timeout: Duration,
}

impl WeatherService {
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

    /// Current conditions for `district`; mock data if unconfigured or failing.
    pub async fn current_weather(&self, district: &str) -> WeatherReport {
        let now = Utc::now();
        let Some(api_key) = self.upstream.api_key.as_deref() else {
            tracing::warn!("Weather API key not configured, using mock data");
            return mock_weather(district, now);
        };

        match self.fetch(district, api_key, now).await {
            Ok(report) => {
                tracing::info!(
                    district,
                    temperature = report.temperature,
                    humidity = report.humidity,
                    condition = %report.condition,
                    "weather data fetched"
                );
                report
            }
            Err(e) => {
                tracing::error!(district, error = %e, "failed to fetch weather, using mock data");
                counter!("upstream_fallback_total", "service" => "weather").increment(1);
                mock_weather(district, now)
            }
        }
    }

    pub async fn weather_health_tips(&self, district: &str) -> WeatherTips {
        let weather = self.current_weather(district).await;
        let health_recommendations = health_recommendations(&weather, Utc::now().month());
        WeatherTips {
            location: district.to_string(),
            timestamp: weather.timestamp,
            weather,
            health_recommendations,
        }
    }

    async fn fetch(
        &self,
        district: &str,
        api_key: &str,
        now: DateTime<Utc>,
    ) -> Result<WeatherReport, FetchError> {
        let coords = district_coordinates(district);
        let (lat, lon) = (coords.lat.to_string(), coords.lon.to_string());
        let base = self.upstream.base_url.trim_end_matches('/');
        let url = reqwest::Url::parse_with_params(
            &format!("{base}/weather"),
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ],
        )
        .map_err(|e| FetchError::permanent(format!("invalid weather url: {e}")))?;

        let body: OwmResponse =
            fetch_with_retry(self.transport.as_ref(), url.as_str(), self.timeout, &self.executor)
                .await?
                .json()?;
        format_report(body, district, now)
    }
}

fn format_report(
    data: OwmResponse,
    district: &str,
    now: DateTime<Utc>,
) -> Result<WeatherReport, FetchError> {
    let cond = data
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::permanent("weather response without conditions"))?;
    Ok(WeatherReport {
        location: district.to_string(),
        temperature: data.main.temp.round() as i64,
        feels_like: data.main.feels_like.round() as i64,
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        condition: cond.main,
        description: cond.description,
        wind_speed: data.wind.and_then(|w| w.speed).unwrap_or(0.0),
        visibility: data.visibility.map(|m| m / 1_000.0),
        timestamp: now,
        is_mock_data: false,
    })
}

pub fn mock_weather(district: &str, now: DateTime<Utc>) -> WeatherReport {
    tracing::info!(district, "using mock weather data");
    WeatherReport {
        location: district.to_string(),
        temperature: 22,
        feels_like: 24,
        humidity: 65,
        pressure: 1013,
        condition: "Partly Cloudy".to_string(),
        description: "partly cloudy".to_string(),
        wind_speed: 3.5,
        visibility: Some(10.0),
        timestamp: now,
        is_mock_data: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{HttpResponse, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<HttpResponse, FetchError>,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for Canned {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.reply.clone()
        }
    }

    fn service(reply: Result<HttpResponse, FetchError>, key: Option<&str>) -> (WeatherService, Arc<Canned>) {
        let t = Arc::new(Canned {
            reply,
            urls: Mutex::new(Vec::new()),
        });
        let svc = WeatherService::new(
            t.clone(),
            UpstreamConfig {
                api_key: key.map(str::to_string),
                base_url: "https://owm.test/data/2.5".to_string(),
                max_retries: WEATHER_MAX_RETRIES,
            },
            RetryExecutor::new(RetryPolicy::default()),
            Duration::from_secs(1),
        );
        (svc, t)
    }

    const OWM_BODY: &str = r#"{
        "weather": [{"id": 501, "main": "Rain", "description": "moderate rain", "icon": "10d"}],
        "main": {"temp": 31.6, "feels_like": 34.2, "temp_min": 30.0, "temp_max": 33.0, "pressure": 1011, "humidity": 84},
        "visibility": 8000,
        "wind": {"speed": 2.1, "deg": 90},
        "name": "Huye"
    }"#;

    #[tokio::test]
    async fn live_response_is_formatted() {
        let (svc, t) = service(Ok(HttpResponse::ok(OWM_BODY)), Some("key"));
        let r = svc.current_weather("Huye").await;

        assert!(!r.is_mock_data);
        assert_eq!(r.temperature, 32);
        assert_eq!(r.feels_like, 34);
        assert_eq!(r.humidity, 84);
        assert_eq!(r.condition, "Rain");
        assert_eq!(r.visibility, Some(8.0));
        assert_eq!(r.wind_speed, 2.1);

        let urls = t.urls.lock().unwrap();
        assert!(urls[0].starts_with("https://owm.test/data/2.5/weather?lat=-2.5967&lon=29.7394"));
        assert!(urls[0].contains("units=metric"));
    }

    #[tokio::test]
    async fn missing_key_uses_mock_without_calling_out() {
        let (svc, t) = service(Ok(HttpResponse::ok(OWM_BODY)), None);
        let r = svc.current_weather("Musanze").await;
        assert!(r.is_mock_data);
        assert_eq!(r.location, "Musanze");
        assert_eq!(r.temperature, 22);
        assert!(t.urls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_gateway_errors_fall_back_after_three_attempts() {
        let (svc, t) = service(Err(FetchError::status(502, "Bad Gateway")), Some("key"));
        let r = svc.current_weather("Kigali").await;
        assert!(r.is_mock_data);
        assert_eq!(t.urls.lock().unwrap().len(), (WEATHER_MAX_RETRIES + 1) as usize);
    }

    #[tokio::test]
    async fn response_without_conditions_is_permanent() {
        let body = r#"{"main": {"temp": 20.0, "feels_like": 20.0, "pressure": 1000, "humidity": 50}}"#;
        let (svc, t) = service(Ok(HttpResponse::ok(body)), Some("key"));
        let r = svc.current_weather("Kigali").await;
        assert!(r.is_mock_data);
        assert_eq!(t.urls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tips_include_recommendations_for_live_weather() {
        let (svc, _) = service(Ok(HttpResponse::ok(OWM_BODY)), Some("key"));
        let tips = svc.weather_health_tips("Huye").await;
        assert_eq!(tips.location, "Huye");
        // Hot, humid and rainy regardless of the month.
        assert!(tips.health_recommendations.len() >= 3);
    }
}
