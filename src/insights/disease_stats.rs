use crate::error::{AppError, Result};
use crate::models::DiseaseKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Reference figures each statistics response is derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineStats {
    pub global_cases: u64,
    pub deaths_per_year: u64,
    /// Percent of the population
    pub prevalence: f64,
    pub new_cases_daily: u64,
    pub countries_affected: u32,
}

pub fn baseline(kind: DiseaseKind) -> BaselineStats {
    match kind {
        DiseaseKind::Diabetes => BaselineStats {
            global_cases: 537_000_000,
            deaths_per_year: 1_500_000,
            prevalence: 6.2,
            new_cases_daily: 1_500,
            countries_affected: 195,
        },
        DiseaseKind::HeartDisease => BaselineStats {
            global_cases: 523_000_000,
            deaths_per_year: 17_900_000,
            prevalence: 6.6,
            new_cases_daily: 2_000,
            countries_affected: 195,
        },
        DiseaseKind::Hypertension => BaselineStats {
            global_cases: 1_280_000_000,
            deaths_per_year: 10_400_000,
            prevalence: 16.5,
            new_cases_daily: 3_500,
            countries_affected: 195,
        },
        DiseaseKind::Asthma => BaselineStats {
            global_cases: 262_000_000,
            deaths_per_year: 455_000,
            prevalence: 3.4,
            new_cases_daily: 800,
            countries_affected: 195,
        },
        DiseaseKind::Stroke => BaselineStats {
            global_cases: 101_000_000,
            deaths_per_year: 6_550_000,
            prevalence: 1.3,
            new_cases_daily: 1_800,
            countries_affected: 195,
        },
    }
}

/// Global figures for one disease
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseStats {
    pub disease: DiseaseKind,
    pub global_cases: u64,
    pub deaths_per_year: u64,
    /// Formatted percentage, e.g. `6.2%`
    pub prevalence: String,
    pub new_cases_daily: u64,
    pub countries_affected: u32,
}

/// World regions with a case multiplier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    Asia,
    Africa,
    SouthAmerica,
    Oceania,
    Global,
}

impl Region {
    pub fn multiplier(&self) -> f64 {
        match self {
            Region::NorthAmerica => 0.8,
            Region::Europe => 0.9,
            Region::Asia => 1.3,
            Region::Africa => 1.1,
            Region::SouthAmerica => 1.0,
            Region::Oceania => 0.7,
            Region::Global => 1.0,
        }
    }

    /// Title-cased name, e.g. `North America`
    pub fn display_name(&self) -> String {
        self.to_string()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        Region::from_str(&normalized).map_err(|_| {
            let known: Vec<String> = Region::iter().map(|r| r.to_string()).collect();
            AppError::Validation(format!(
                "Unknown region '{}', expected one of: {}",
                raw,
                known.join(", ")
            ))
        })
    }
}

/// Regional share of a disease's global burden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalStats {
    pub disease: DiseaseKind,
    pub region: String,
    pub cases: u64,
    pub prevalence: String,
    pub deaths_per_year: u64,
}

/// Search-trend entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub name: String,
    pub trend: String,
}

/// Fraction of the scaled global figures attributed to one region
const REGIONAL_SHARE: f64 = 0.2;

/// Statistics with a fixed variation factor applied to the counts
pub fn stats_with_variation(kind: DiseaseKind, variation: f64) -> DiseaseStats {
    let base = baseline(kind);
    DiseaseStats {
        disease: kind,
        global_cases: scale(base.global_cases, variation),
        deaths_per_year: scale(base.deaths_per_year, variation),
        prevalence: format!("{:.1}%", base.prevalence),
        new_cases_daily: scale(base.new_cases_daily, variation),
        countries_affected: base.countries_affected,
    }
}

/// Statistics with a random ±5% variation, like a live feed would show
pub fn disease_stats(kind: DiseaseKind) -> DiseaseStats {
    let variation = rand::thread_rng().gen_range(0.95..=1.05);
    stats_with_variation(kind, variation)
}

pub fn all_disease_stats() -> Vec<DiseaseStats> {
    DiseaseKind::all().into_iter().map(disease_stats).collect()
}

pub fn regional_stats_from(stats: &DiseaseStats, region: Region) -> RegionalStats {
    let multiplier = region.multiplier();
    let base = baseline(stats.disease);

    RegionalStats {
        disease: stats.disease,
        region: region.display_name(),
        cases: scale(stats.global_cases, multiplier * REGIONAL_SHARE),
        prevalence: format!("{:.1}%", base.prevalence * multiplier),
        deaths_per_year: scale(stats.deaths_per_year, multiplier * REGIONAL_SHARE),
    }
}

pub fn regional_stats(kind: DiseaseKind, region: Region) -> RegionalStats {
    regional_stats_from(&disease_stats(kind), region)
}

pub fn trending_topics() -> Vec<TrendingTopic> {
    [
        ("COVID-19", "+15%"),
        ("Diabetes", "+8%"),
        ("Heart Disease", "+5%"),
        ("Mental Health", "+12%"),
    ]
    .into_iter()
    .map(|(name, trend)| TrendingTopic {
        name: name.to_string(),
        trend: trend.to_string(),
    })
    .collect()
}

fn scale(value: u64, factor: f64) -> u64 {
    (value as f64 * factor).floor() as u64
}
