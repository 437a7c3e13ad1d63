use crate::models::Review;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Words kept in a cloud
pub const MAX_WORDS: usize = 50;
const MIN_WORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "few", "for", "from", "further", "get", "got", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "really", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Most frequent words across the given texts, highest count first; ties
/// are broken alphabetically.
pub fn word_frequencies<'a, I>(texts: I) -> Vec<WordCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut counts: HashMap<String, u64> = HashMap::new();

    for text in texts {
        let lower = text.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphabetic()) {
            if word.chars().count() < MIN_WORD_LEN || stop_words.contains(word) {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    let mut words: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(MAX_WORDS);
    words
}

pub fn review_word_cloud(reviews: &[Review]) -> Vec<WordCount> {
    word_frequencies(reviews.iter().map(|r| r.comment.as_str()))
}
