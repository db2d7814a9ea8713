use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 5;
pub const MAX_GESTATIONAL_WEEK: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

impl BloodPressure {
    pub fn new(systolic: u16, diastolic: u16) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }

    /// Mean arterial pressure, used as the single blood pressure signal in trend comparisons.
    pub fn mean_arterial(&self) -> f64 {
        (self.systolic as f64 + 2.0 * self.diastolic as f64) / 3.0
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} mmHg", self.systolic, self.diastolic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Headache,
    Swelling,
    SleepQuality,
    Fatigue,
    Mood,
    Dizziness,
    BloodPressure,
}

impl Signal {
    pub const SYMPTOMS: [Signal; 6] = [
        Signal::Headache,
        Signal::Swelling,
        Signal::SleepQuality,
        Signal::Fatigue,
        Signal::Mood,
        Signal::Dizziness,
    ];

    pub const ALL: [Signal; 7] = [
        Signal::Headache,
        Signal::Swelling,
        Signal::SleepQuality,
        Signal::Fatigue,
        Signal::Mood,
        Signal::Dizziness,
        Signal::BloodPressure,
    ];

    /// Sleep quality and mood are reported with 5 as the best value.
    pub fn is_inverse(self) -> bool {
        matches!(self, Signal::SleepQuality | Signal::Mood)
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::Headache => "headache",
            Signal::Swelling => "swelling",
            Signal::SleepQuality => "poor sleep",
            Signal::Fatigue => "fatigue",
            Signal::Mood => "low mood",
            Signal::Dizziness => "dizziness",
            Signal::BloodPressure => "blood pressure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyCheckIn {
    pub week: u32,
    pub date: NaiveDate,
    pub headache: u8,
    pub swelling: u8,
    pub sleep_quality: u8,
    pub fatigue: u8,
    pub mood: u8,
    pub dizziness: u8,
    pub blood_pressure: BloodPressure,
}

impl WeeklyCheckIn {
    pub fn severity(&self, signal: Signal) -> Option<u8> {
        match signal {
            Signal::Headache => Some(self.headache),
            Signal::Swelling => Some(self.swelling),
            Signal::SleepQuality => Some(self.sleep_quality),
            Signal::Fatigue => Some(self.fatigue),
            Signal::Mood => Some(self.mood),
            Signal::Dizziness => Some(self.dizziness),
            Signal::BloodPressure => None,
        }
    }

    /// Severity on the 1..=5 scale where 5 is always the riskiest value.
    pub fn risk_severity(&self, signal: Signal) -> Option<u8> {
        self.severity(signal).map(|value| {
            if signal.is_inverse() {
                MAX_SEVERITY + MIN_SEVERITY - value
            } else {
                value
            }
        })
    }

    pub fn signal_value(&self, signal: Signal) -> f64 {
        match self.risk_severity(signal) {
            Some(value) => value as f64,
            None => self.blood_pressure.mean_arterial(),
        }
    }
}

/// Collapses duplicate weeks last-write-wins and orders ascending by week.
pub fn latest_per_week(check_ins: &[WeeklyCheckIn]) -> Vec<WeeklyCheckIn> {
    let mut by_week: BTreeMap<u32, &WeeklyCheckIn> = BTreeMap::new();
    for check_in in check_ins {
        by_week.insert(check_in.week, check_in);
    }
    by_week.into_values().cloned().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInInput {
    pub week: Option<i64>,
    pub date: Option<NaiveDate>,
    pub headache: Option<i64>,
    pub swelling: Option<i64>,
    pub sleep_quality: Option<i64>,
    pub fatigue: Option<i64>,
    pub mood: Option<i64>,
    pub dizziness: Option<i64>,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
}

impl CheckInInput {
    pub fn validate(&self) -> Result<WeeklyCheckIn, ValidationError> {
        let mut problems = Vec::new();

        let week = require_in_range(
            &mut problems,
            "week",
            self.week,
            1,
            MAX_GESTATIONAL_WEEK as i64,
        );
        if self.date.is_none() {
            problems.push("date is required".to_string());
        }
        let headache = require_severity(&mut problems, "headache", self.headache);
        let swelling = require_severity(&mut problems, "swelling", self.swelling);
        let sleep_quality = require_severity(&mut problems, "sleep_quality", self.sleep_quality);
        let fatigue = require_severity(&mut problems, "fatigue", self.fatigue);
        let mood = require_severity(&mut problems, "mood", self.mood);
        let dizziness = require_severity(&mut problems, "dizziness", self.dizziness);
        let systolic = require_in_range(&mut problems, "systolic", self.systolic, 60, 260);
        let diastolic = require_in_range(&mut problems, "diastolic", self.diastolic, 30, 180);

        if let (Some(sys), Some(dia)) = (systolic, diastolic) {
            if sys <= dia {
                problems.push(format!(
                    "systolic ({sys}) must be greater than diastolic ({dia})"
                ));
            }
        }

        match (
            week,
            self.date,
            headache,
            swelling,
            sleep_quality,
            fatigue,
            mood,
            dizziness,
            systolic,
            diastolic,
        ) {
            (
                Some(week),
                Some(date),
                Some(headache),
                Some(swelling),
                Some(sleep_quality),
                Some(fatigue),
                Some(mood),
                Some(dizziness),
                Some(systolic),
                Some(diastolic),
            ) if problems.is_empty() => Ok(WeeklyCheckIn {
                week: week as u32,
                date,
                headache: headache as u8,
                swelling: swelling as u8,
                sleep_quality: sleep_quality as u8,
                fatigue: fatigue as u8,
                mood: mood as u8,
                dizziness: dizziness as u8,
                blood_pressure: BloodPressure::new(systolic as u16, diastolic as u16),
            }),
            _ => Err(ValidationError::new(problems)),
        }
    }
}

fn require_severity(problems: &mut Vec<String>, field: &str, value: Option<i64>) -> Option<i64> {
    require_in_range(
        problems,
        field,
        value,
        MIN_SEVERITY as i64,
        MAX_SEVERITY as i64,
    )
}

fn require_in_range(
    problems: &mut Vec<String>,
    field: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> Option<i64> {
    match value {
        None => {
            problems.push(format!("{field} is required"));
            None
        }
        Some(v) if v < min || v > max => {
            problems.push(format!("{field} must be between {min} and {max}, got {v}"));
            None
        }
        Some(v) => Some(v),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }

    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::Low => RiskLevel::Moderate,
            RiskLevel::Moderate | RiskLevel::High => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpBand {
    Normal,
    Moderate,
    High,
}

impl BpBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BpBand::Normal => "normal",
            BpBand::Moderate => "elevated",
            BpBand::High => "high",
        }
    }

    pub fn level_floor(&self) -> RiskLevel {
        match self {
            BpBand::Normal => RiskLevel::Low,
            BpBand::Moderate => RiskLevel::Moderate,
            BpBand::High => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    Headache,
    Swelling,
    PoorSleep,
    Fatigue,
    LowMood,
    Dizziness,
    BloodPressureModerate,
    BloodPressureHigh,
    RisingTrend,
}

impl RiskFlag {
    pub fn for_symptom(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Headache => Some(RiskFlag::Headache),
            Signal::Swelling => Some(RiskFlag::Swelling),
            Signal::SleepQuality => Some(RiskFlag::PoorSleep),
            Signal::Fatigue => Some(RiskFlag::Fatigue),
            Signal::Mood => Some(RiskFlag::LowMood),
            Signal::Dizziness => Some(RiskFlag::Dizziness),
            Signal::BloodPressure => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AppointmentFlag,
    BpMonitoring,
    SymptomWatch,
    NutritionAdjust,
    HydrationCheck,
    SleepSupport,
    CommunitySuggest,
    RoutineCare,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AppointmentFlag => "appointment_flag",
            ActionType::BpMonitoring => "bp_monitoring",
            ActionType::SymptomWatch => "symptom_watch",
            ActionType::NutritionAdjust => "nutrition_adjust",
            ActionType::HydrationCheck => "hydration_check",
            ActionType::SleepSupport => "sleep_support",
            ActionType::CommunitySuggest => "community_suggest",
            ActionType::RoutineCare => "routine_care",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AiContent {
    #[default]
    NotRequested,
    Pending,
    Ready(String),
    Failed(String),
}

impl AiContent {
    pub fn text(&self) -> Option<&str> {
        match self {
            AiContent::Ready(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAction {
    pub action_type: ActionType,
    pub description: String,
    pub ai_content: AiContent,
}

impl SystemAction {
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            action_type,
            description: description.into(),
            ai_content: AiContent::NotRequested,
        }
    }

    /// Merges an enrichment result. Only a pending action accepts one, so a late
    /// result can never overwrite content from a newer round.
    pub fn merge_enrichment(&mut self, result: Result<String, String>) -> bool {
        if self.ai_content != AiContent::Pending {
            return false;
        }
        self.ai_content = match result {
            Ok(text) => AiContent::Ready(text),
            Err(reason) => AiContent::Failed(reason),
        };
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub signal: Signal,
    pub severity: u8,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub week: u32,
    /// Date of the check-in this assessment was generated for.
    pub generated_at: NaiveDate,
    pub overall_level: RiskLevel,
    pub weighted_score: f64,
    pub numeric_risk_score: f64,
    pub blood_pressure: BloodPressure,
    pub bp_band: BpBand,
    pub flags: BTreeSet<RiskFlag>,
    pub contributions: Vec<SignalContribution>,
    pub trend_escalated: bool,
    pub actions: Vec<SystemAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTrajectoryPoint {
    pub week: u32,
    pub numeric_risk_score: f64,
    pub level: RiskLevel,
    pub flags: BTreeSet<RiskFlag>,
}

impl From<&RiskAssessment> for RiskTrajectoryPoint {
    fn from(assessment: &RiskAssessment) -> Self {
        Self {
            week: assessment.week,
            numeric_risk_score: assessment.numeric_risk_score,
            level: assessment.overall_level,
            flags: assessment.flags.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            "mixed" => Ok(Sentiment::Mixed),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCheckIn {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub text: String,
    pub emoji: String,
    pub sentiment: Sentiment,
    pub confidence_scores: Option<ConfidenceScores>,
    pub sentiment_score: f64,
    pub emoji_mismatch: bool,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub has_alert: bool,
    pub streak_count: usize,
    pub recent_negative: Vec<DailyCheckIn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTone {
    Encouraging,
    Supportive,
    Compassionate,
}

impl From<RiskLevel> for ChatTone {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => ChatTone::Encouraging,
            RiskLevel::Moderate => ChatTone::Supportive,
            RiskLevel::High => ChatTone::Compassionate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> CheckInInput {
        CheckInInput {
            week: Some(20),
            date: NaiveDate::from_ymd_opt(2026, 3, 2),
            headache: Some(2),
            swelling: Some(3),
            sleep_quality: Some(4),
            fatigue: Some(2),
            mood: Some(4),
            dizziness: Some(1),
            systolic: Some(118),
            diastolic: Some(76),
        }
    }

    #[test]
    fn complete_input_validates() {
        let check_in = complete_input().validate().unwrap();
        assert_eq!(check_in.week, 20);
        assert_eq!(check_in.blood_pressure, BloodPressure::new(118, 76));
    }

    #[test]
    fn missing_and_out_of_range_fields_are_all_reported() {
        let input = CheckInInput {
            headache: None,
            swelling: Some(7),
            systolic: None,
            ..complete_input()
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.problems.len(), 3);
        assert!(err.problems.iter().any(|p| p == "headache is required"));
        assert!(err.problems.iter().any(|p| p.starts_with("swelling must be between 1 and 5")));
        assert!(err.problems.iter().any(|p| p == "systolic is required"));
    }

    #[test]
    fn inverted_pressure_is_rejected() {
        let input = CheckInInput {
            systolic: Some(80),
            diastolic: Some(90),
            ..complete_input()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn inverse_signals_flip_to_risk_orientation() {
        let check_in = complete_input().validate().unwrap();
        assert_eq!(check_in.risk_severity(Signal::SleepQuality), Some(2));
        assert_eq!(check_in.risk_severity(Signal::Swelling), Some(3));
        assert_eq!(check_in.risk_severity(Signal::BloodPressure), None);
    }

    #[test]
    fn latest_per_week_keeps_last_submission() {
        let first = complete_input().validate().unwrap();
        let mut second = first.clone();
        second.headache = 5;
        let mut earlier = first.clone();
        earlier.week = 18;

        let collapsed = latest_per_week(&[first, earlier, second]);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].week, 18);
        assert_eq!(collapsed[1].headache, 5);
    }

    #[test]
    fn merge_only_applies_to_pending_actions() {
        let mut action = SystemAction::new(ActionType::RoutineCare, "Keep going");
        assert!(!action.merge_enrichment(Ok("late".to_string())));
        assert_eq!(action.ai_content, AiContent::NotRequested);

        action.ai_content = AiContent::Pending;
        assert!(action.merge_enrichment(Ok("Explained".to_string())));
        assert_eq!(action.ai_content.text(), Some("Explained"));
        assert_eq!(action.description, "Keep going");
    }

    #[test]
    fn chat_tone_follows_level() {
        assert_eq!(ChatTone::from(RiskLevel::Low), ChatTone::Encouraging);
        assert_eq!(ChatTone::from(RiskLevel::Moderate), ChatTone::Supportive);
        assert_eq!(ChatTone::from(RiskLevel::High), ChatTone::Compassionate);
    }
}
