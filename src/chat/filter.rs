//! Keyword filter deciding whether a chat message is on-topic

const HEALTH_KEYWORDS: &[&str] = &[
    // medical terms
    "symptom", "pain", "ache", "fever", "headache", "cough", "cold", "flu", "disease", "illness",
    "sick", "health", "medical", "doctor", "hospital", "medicine", "medication", "treatment",
    "therapy", "diagnosis",
    // body parts
    "heart", "lung", "liver", "kidney", "stomach", "head", "chest", "back", "arm", "leg", "hand",
    "foot", "eye", "ear", "nose", "throat", "skin",
    // conditions
    "diabetes", "hypertension", "asthma", "cancer", "stroke", "heart disease", "blood pressure",
    "cholesterol", "glucose", "sugar", "insulin",
    // lifestyle
    "diet", "exercise", "weight", "bmi", "smoking", "alcohol", "sleep", "stress", "anxiety",
    "depression", "mental health", "physical health",
    // question openers
    "how to", "what is", "why do", "when should", "can i", "should i", "prevent", "avoid",
    "reduce", "manage", "control", "improve",
    // risk factors
    "risk", "chance", "probability", "family history", "genetic", "age", "gender", "lifestyle",
    "occupation", "environment",
    // general
    "wellness", "fitness", "nutrition", "vitamin", "supplement", "checkup", "screening", "test",
    "examination", "consultation",
];

/// Phrases that mark a message off-topic even when a health keyword matches
const STRONG_NON_HEALTH: &[&str] = &[
    "how do i cook", "how to cook", "recipe for", "best movie", "watch movie", "capital of",
    "learn to play", "how to play", "teach me", "cooking", "movie recommendation",
    "film recommendation", "music recommendation", "learn to play guitar", "how to play guitar",
    "guitar lessons",
];

const NON_HEALTH_TOPICS: &[&str] = &[
    "weather", "politics", "sports", "entertainment", "movies", "music", "cooking", "recipes",
    "travel", "vacation", "shopping", "fashion", "technology", "computer", "phone", "car",
    "house", "job", "work", "school", "education", "math", "science", "history", "geography",
    "joke", "funny", "humor", "game", "play", "hobby", "pet", "animal", "cook", "pasta", "food",
    "recipe", "movie", "film", "watch", "capital", "country", "city", "guitar", "instrument",
    "learn", "teach",
];

/// Substring matching on the lower-cased message. Ambiguous messages count
/// as health-related.
pub fn is_health_related(message: &str) -> bool {
    let lower = message.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(STRONG_NON_HEALTH) {
        return false;
    }
    if contains_any(HEALTH_KEYWORDS) {
        return true;
    }
    !contains_any(NON_HEALTH_TOPICS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_questions() {
        assert!(is_health_related("What are the symptoms of diabetes?"));
        assert!(is_health_related("My CHEST hurts after running"));
        assert!(is_health_related("Is 140/90 high blood pressure?"));
    }

    #[test]
    fn test_strong_non_health_overrides_keywords() {
        // "how to" is a health keyword, but cooking wins
        assert!(!is_health_related("How to cook pasta?"));
        assert!(!is_health_related("What is the capital of France?"));
        assert!(!is_health_related("Can you teach me guitar"));
    }

    #[test]
    fn test_non_health_topics() {
        assert!(!is_health_related("Tell me a joke"));
        assert!(!is_health_related("Will the weather be nice tomorrow"));
    }

    #[test]
    fn test_ambiguous_defaults_to_health() {
        assert!(is_health_related("hmm"));
        assert!(is_health_related(""));
    }
}
