// src/weather/mod.rs
//! District weather and the health advice derived from it.

pub mod service;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use service::{WeatherService, WeatherTips};

pub const DEFAULT_DISTRICT: &str = "Kigali";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// City-centre fallback for districts we don't know.
pub const KIGALI: Coordinates = Coordinates {
    lat: -1.9441,
    lon: 30.0619,
};

const fn c(lat: f64, lon: f64) -> Coordinates {
    Coordinates { lat, lon }
}

pub const DISTRICTS: [(&str, Coordinates); 30] = [
    ("Bugesera", c(-2.2167, 30.2000)),
    ("Burera", c(-1.4833, 29.8667)),
    ("Gakenke", c(-1.6833, 29.7833)),
    ("Gasabo", c(-1.9536, 30.1044)),
    ("Gatsibo", c(-1.5833, 30.4167)),
    ("Gicumbi", c(-1.5500, 30.1167)),
    ("Gisagara", c(-2.5333, 29.8333)),
    ("Huye", c(-2.5967, 29.7394)),
    ("Kamonyi", c(-2.0333, 29.8167)),
    ("Karongi", c(-1.9667, 29.3833)),
    ("Kayonza", c(-1.8833, 30.6167)),
    ("Kicukiro", c(-1.9667, 30.1000)),
    ("Kirehe", c(-2.2167, 30.7167)),
    ("Muhanga", c(-2.0833, 29.7500)),
    ("Musanze", c(-1.4997, 29.6350)),
    ("Ngoma", c(-2.1833, 30.5333)),
    ("Ngororero", c(-1.7833, 29.5333)),
    ("Nyabihu", c(-1.6500, 29.5167)),
    ("Nyagatare", c(-1.2833, 30.3167)),
    ("Nyamagabe", c(-2.4500, 29.6167)),
    ("Nyamasheke", c(-2.3167, 29.1167)),
    ("Nyanza", c(-2.3500, 29.7500)),
    ("Nyarugenge", c(-1.9536, 30.0606)),
    ("Nyaruguru", c(-2.5833, 29.5000)),
    ("Rubavu", c(-1.6833, 29.2667)),
    ("Ruhango", c(-2.1833, 29.7833)),
    ("Rulindo", c(-1.7667, 30.0667)),
    ("Rusizi", c(-2.4833, 28.9167)),
    ("Rutsiro", c(-1.8333, 29.3333)),
    ("Rwamagana", c(-1.9500, 30.4333)),
];

/// Case-insensitive district lookup, falling back to Kigali.
pub fn district_coordinates(district: &str) -> Coordinates {
    let d = district.trim();
    DISTRICTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(d))
        .map_or(KIGALI, |(_, coords)| *coords)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    /// Degrees Celsius, rounded.
    pub temperature: i64,
    pub feels_like: i64,
    /// Percent.
    pub humidity: u32,
    /// hPa.
    pub pressure: u32,
    pub condition: String,
    pub description: String,
    /// m/s.
    pub wind_speed: f64,
    /// Kilometres.
    pub visibility: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_mock_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    HeatWarning,
    ColdWeather,
    HighHumidity,
    RainyWeather,
    StormWarning,
    MalariaSeason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecommendation {
    #[serde(rename = "type")]
    pub kind: AdviceKind,
    pub priority: Priority,
    pub title: &'static str,
    pub message: &'static str,
    pub actions: &'static [&'static str],
}

const HEAT: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::HeatWarning,
    priority: Priority::High,
    title: "Heat Warning",
    message: "High temperatures detected. Stay hydrated and avoid prolonged sun exposure.",
    actions: &[
        "Drink plenty of water throughout the day",
        "Wear light-colored, loose-fitting clothing",
        "Seek shade during peak hours (10 AM - 4 PM)",
        "Watch for signs of heat exhaustion",
    ],
};

const COLD: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::ColdWeather,
    priority: Priority::Medium,
    title: "Cold Weather Advisory",
    message: "Cool temperatures may affect those with respiratory conditions.",
    actions: &[
        "Dress warmly in layers",
        "Keep indoor spaces well-ventilated but warm",
        "Be extra cautious if you have asthma or COPD",
        "Ensure adequate nutrition to maintain body heat",
    ],
};

const HUMID: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::HighHumidity,
    priority: Priority::Medium,
    title: "High Humidity Alert",
    message: "High humidity can worsen respiratory conditions and increase infection risk.",
    actions: &[
        "Ensure good ventilation in living spaces",
        "Be aware of increased mosquito activity",
        "Monitor for signs of respiratory discomfort",
        "Keep skin dry to prevent fungal infections",
    ],
};

const RAIN: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::RainyWeather,
    priority: Priority::High,
    title: "Rainy Season Health Alert",
    message: "Rainy weather increases risk of waterborne diseases and mosquito-borne illnesses.",
    actions: &[
        "Use mosquito nets and repellents",
        "Ensure drinking water is clean and safe",
        "Avoid walking through stagnant water",
        "Be extra vigilant about malaria symptoms",
        "Keep wounds clean and dry",
    ],
};

const STORM: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::StormWarning,
    priority: Priority::High,
    title: "Thunderstorm Safety",
    message: "Severe weather can pose health and safety risks.",
    actions: &[
        "Stay indoors during the storm",
        "Avoid using electrical appliances",
        "Keep emergency supplies ready",
        "Monitor for flooding in your area",
    ],
};

const MALARIA_SEASON: HealthRecommendation = HealthRecommendation {
    kind: AdviceKind::MalariaSeason,
    priority: Priority::High,
    title: "Malaria Prevention - Rainy Season",
    message: "This is peak malaria season in Rwanda. Take extra precautions.",
    actions: &[
        "Sleep under treated mosquito nets",
        "Use mosquito repellent regularly",
        "Eliminate standing water around your home",
        "Seek immediate medical attention for fever",
        "Consider prophylactic medication if traveling",
    ],
};

/// Advice for the given conditions. `month` is 1-based; March..=May is the
/// long rainy season.
pub fn health_recommendations(report: &WeatherReport, month: u32) -> Vec<HealthRecommendation> {
    let mut out = Vec::new();

    if report.temperature > 30 {
        out.push(HEAT);
    }
    if report.temperature < 15 {
        out.push(COLD);
    }
    if report.humidity > 80 {
        out.push(HUMID);
    }
    if report.condition == "Rain" || report.description.contains("rain") {
        out.push(RAIN);
    }
    if report.condition == "Thunderstorm" {
        out.push(STORM);
    }
    if (3..=5).contains(&month) {
        out.push(MALARIA_SEASON);
    }

    out
}
