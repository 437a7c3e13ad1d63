//! Read-only views derived from stored data and the mock statistics feed

pub mod dashboard;
pub mod disease_stats;
pub mod wordcloud;

pub use dashboard::{DashboardData, DashboardProvider};
pub use disease_stats::{
    all_disease_stats, disease_stats, regional_stats, trending_topics, DiseaseStats, Region,
    RegionalStats, TrendingTopic,
};
pub use wordcloud::{review_word_cloud, word_frequencies, WordCount};
