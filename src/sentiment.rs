use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AnalysisError, SessionError};
use crate::models::{ConfidenceScores, DailyCheckIn, SafetyAlert, Sentiment};

pub const DEFAULT_STREAK_THRESHOLD: usize = 3;

const POSITIVE_LABEL_SCORE: f64 = 0.8;
const NEGATIVE_LABEL_SCORE: f64 = -0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

impl From<Sentiment> for Polarity {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Positive => Polarity::Positive,
            Sentiment::Negative => Polarity::Negative,
            Sentiment::Neutral | Sentiment::Mixed => Polarity::Neutral,
        }
    }
}

pub fn emoji_polarity(emoji: &str) -> Option<Polarity> {
    match emoji.trim() {
        "😊" | "😄" | "😁" | "🙂" | "😍" | "🥰" | "😌" | "🤗" | "❤️" => Some(Polarity::Positive),
        "😐" | "😶" | "🤔" | "😴" | "🥱" => Some(Polarity::Neutral),
        "😢" | "😞" | "😔" | "😟" | "😠" | "😡" | "😰" | "😭" | "😫" | "😣" => {
            Some(Polarity::Negative)
        }
        _ => None,
    }
}

/// True only when glyph and text have strictly opposite polarity.
pub fn check_emoji_mismatch(emoji: &str, sentiment: Sentiment) -> bool {
    matches!(
        (emoji_polarity(emoji), Polarity::from(sentiment)),
        (Some(Polarity::Positive), Polarity::Negative)
            | (Some(Polarity::Negative), Polarity::Positive)
    )
}

/// Leading run of negative entries, newest first. Caller ordering is never trusted.
pub fn detect_negative_streak(entries: &[DailyCheckIn], threshold: usize) -> SafetyAlert {
    let mut newest_first: Vec<&DailyCheckIn> = entries.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date));

    let streak: Vec<&DailyCheckIn> = newest_first
        .into_iter()
        .take_while(|entry| entry.sentiment == Sentiment::Negative)
        .collect();

    SafetyAlert {
        has_alert: streak.len() >= threshold,
        streak_count: streak.len(),
        recent_negative: streak.into_iter().take(threshold).cloned().collect(),
    }
}

/// Signed score in -1..=1. Confidence scores win over the per-label constants;
/// the two paths are not numerically comparable.
pub fn sentiment_to_score(sentiment: Sentiment, confidence: Option<&ConfidenceScores>) -> f64 {
    if let Some(scores) = confidence {
        return (scores.positive - scores.negative).clamp(-1.0, 1.0);
    }
    match sentiment {
        Sentiment::Positive => POSITIVE_LABEL_SCORE,
        Sentiment::Negative => NEGATIVE_LABEL_SCORE,
        Sentiment::Neutral | Sentiment::Mixed => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub confidence: Option<ConfidenceScores>,
}

impl Classification {
    pub fn neutral() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: None,
        }
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, AnalysisError>;
}

/// Debounced, last-request-wins wrapper for live previews while the user types.
#[derive(Debug)]
pub struct PreviewGate {
    debounce: Duration,
    latest: AtomicU64,
}

impl PreviewGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            latest: AtomicU64::new(0),
        }
    }

    /// Waits out the debounce window, then classifies. Resolves to
    /// `StaleRequest` whenever a newer call started before this one finished,
    /// including when the classifier answer arrives after being superseded.
    pub async fn classify(
        &self,
        classifier: &dyn SentimentClassifier,
        text: &str,
    ) -> Result<Classification, SessionError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if self.is_superseded(ticket) {
            return Err(SessionError::StaleRequest);
        }

        let result = classifier.classify(text).await;
        if self.is_superseded(ticket) {
            tracing::debug!(ticket, "discarding superseded sentiment preview");
            return Err(SessionError::StaleRequest);
        }
        Ok(result?)
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) != ticket
    }
}
