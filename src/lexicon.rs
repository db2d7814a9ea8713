use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::models::{ConfidenceScores, Sentiment};
use crate::sentiment::{Classification, SentimentClassifier};

const POSITIVE_TERMS: &[&str] = &[
    "happy", "calm", "grateful", "excited", "relieved", "rested", "better", "good", "great",
    "hopeful", "loved", "peaceful", "energised", "energized", "proud", "kicking",
];

const NEGATIVE_TERMS: &[&str] = &[
    "sad", "anxious", "worried", "scared", "exhausted", "tired", "overwhelmed", "lonely",
    "hopeless", "angry", "crying", "cried", "awful", "terrible", "stressed", "pain", "numb",
    "can't cope", "panic",
];

const FACTOR_TERMS: &[(&str, &[&str])] = &[
    ("sleep", &["sleep", "insomnia", "awake", "nap", "rested"]),
    ("anxiety", &["anxious", "worried", "panic", "nervous", "scared"]),
    ("pain", &["pain", "ache", "cramp", "sore", "headache"]),
    ("fatigue", &["tired", "exhausted", "drained", "fatigue"]),
    ("support", &["partner", "friend", "family", "mum", "mom", "midwife", "group"]),
    ("baby", &["baby", "kick", "kicking", "scan", "ultrasound", "nursery"]),
    ("work", &["work", "job", "boss", "deadline", "office"]),
    ("relationship", &["argument", "fight", "lonely", "alone", "conflict"]),
];

/// Counts positive and negative terms and turns the counts into confidence scores.
#[derive(Debug, Default, Clone)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn classify_text(&self, text: &str) -> Classification {
        let normalized = normalize(text);
        let words = words(&normalized);
        let positive = count_terms(&words, POSITIVE_TERMS) as f64;
        let negative = count_terms(&words, NEGATIVE_TERMS) as f64;

        if positive == 0.0 && negative == 0.0 {
            return Classification {
                sentiment: Sentiment::Neutral,
                confidence: Some(ConfidenceScores {
                    positive: 0.1,
                    neutral: 0.8,
                    negative: 0.1,
                }),
            };
        }

        // one pseudo-count of neutral mass keeps single-word entries from reading as certain
        let total = positive + negative + 1.0;
        let confidence = ConfidenceScores {
            positive: positive / total,
            neutral: 1.0 / total,
            negative: negative / total,
        };
        let sentiment = if positive > 0.0 && negative > 0.0 && (positive - negative).abs() <= 1.0 {
            Sentiment::Mixed
        } else if positive > negative {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        };

        Classification {
            sentiment,
            confidence: Some(confidence),
        }
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::InvalidResponse(
                "nothing to classify".to_string(),
            ));
        }
        Ok(self.classify_text(text))
    }
}

/// Anonymized factor tags mentioned in a journal entry, in table order.
pub fn extract_factors(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let words = words(&normalized);
    FACTOR_TERMS
        .iter()
        .filter(|(_, terms)| count_terms(&words, terms) > 0)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace('\u{2019}', "'")
}

fn words(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|word| !word.is_empty())
        .collect()
}

// multi-word terms must appear as consecutive words
fn count_terms(words: &[&str], terms: &[&str]) -> usize {
    terms
        .iter()
        .filter(|term| {
            let parts: Vec<&str> = term.split(' ').collect();
            words.windows(parts.len()).any(|window| window == parts.as_slice())
        })
        .count()
}
