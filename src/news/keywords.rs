// src/news/keywords.rs
//! Scoring and categorization tables. Plain data; the ranker walks them.

use super::HealthCategory;

/// A group of lowercase keywords sharing one weight. Every keyword found in
/// the text adds the weight once.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    pub name: &'static str,
    pub weight: i64,
    pub keywords: &'static [&'static str],
}

pub const REGIONAL: KeywordSet = KeywordSet {
    name: "regional",
    weight: 10,
    keywords: &["rwanda", "kigali", "rwandan", "east africa"],
};

pub const PRIORITY_HEALTH: KeywordSet = KeywordSet {
    name: "priority_health",
    weight: 8,
    keywords: &[
        "malaria",
        "covid",
        "vaccination",
        "epidemic",
        "outbreak",
        "maternal health",
        "child health",
        "nutrition",
        "hiv",
        "aids",
    ],
};

pub const GENERAL_HEALTH: KeywordSet = KeywordSet {
    name: "general_health",
    weight: 3,
    keywords: &[
        "health",
        "medical",
        "hospital",
        "doctor",
        "treatment",
        "disease",
        "medicine",
        "healthcare",
        "clinic",
        "patient",
    ],
};

pub const SCORING_SETS: [KeywordSet; 3] = [REGIONAL, PRIORITY_HEALTH, GENERAL_HEALTH];

/// Age bucket: articles at most `max_age_days` old earn `bonus`.
#[derive(Debug, Clone, Copy)]
pub struct RecencyBucket {
    pub max_age_days: f64,
    pub bonus: i64,
}

/// Ordered freshest first; the first bucket that fits wins.
pub const RECENCY_BUCKETS: [RecencyBucket; 3] = [
    RecencyBucket {
        max_age_days: 1.0,
        bonus: 5,
    },
    RecencyBucket {
        max_age_days: 7.0,
        bonus: 3,
    },
    RecencyBucket {
        max_age_days: 30.0,
        bonus: 1,
    },
];

/// Evaluated top to bottom; first rule with any matching keyword wins.
/// Anything unmatched is `HealthCategory::General`.
pub const CATEGORY_RULES: [(&[&str], HealthCategory); 10] = [
    (&["malaria", "mosquito"], HealthCategory::Malaria),
    (&["covid", "coronavirus"], HealthCategory::Covid19),
    (&["vaccination", "vaccine"], HealthCategory::Vaccination),
    (&["maternal", "pregnancy"], HealthCategory::MaternalHealth),
    (&["child", "pediatric"], HealthCategory::ChildHealth),
    (&["nutrition", "malnutrition"], HealthCategory::Nutrition),
    (&["mental health", "depression"], HealthCategory::MentalHealth),
    (&["hiv", "aids"], HealthCategory::HivAids),
    (&["cancer", "oncology"], HealthCategory::Cancer),
    (&["diabetes", "hypertension"], HealthCategory::NonCommunicable),
];
