use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::enrichment::ContentEnricher;
use crate::error::{SessionError, ValidationError};
use crate::lexicon::{extract_factors, LexiconClassifier};
use crate::models::{
    AiContent, ChatTone, CheckInInput, DailyCheckIn, RiskAssessment, RiskLevel,
    RiskTrajectoryPoint, SafetyAlert, WeeklyCheckIn,
};
use crate::report;
use crate::risk::assess_risk;
use crate::sentiment::{
    check_emoji_mismatch, detect_negative_streak, sentiment_to_score, Classification,
    PreviewGate, SentimentClassifier,
};
use crate::store::{upsert_sorted, CheckInStore};
use crate::trajectory::build_risk_trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Scoring,
    Persisted,
    Enriching,
    Enriched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInput {
    pub text: String,
    pub emoji: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SessionState {
    check_ins: Vec<WeeklyCheckIn>,
    daily: Vec<DailyCheckIn>,
    assessment: Option<RiskAssessment>,
    trajectory: Vec<RiskTrajectoryPoint>,
    /// Bumped on every submission and clear; enrichment results from older rounds are dropped.
    enrichment_round: u64,
    enrichment_running: bool,
}

pub struct RiskSession<S: CheckInStore> {
    store: Arc<S>,
    config: Arc<EngineConfig>,
    classifier: Arc<dyn SentimentClassifier>,
    enricher: Option<Arc<dyn ContentEnricher>>,
    state: Arc<Mutex<SessionState>>,
    phase: Arc<watch::Sender<SubmissionPhase>>,
    preview: PreviewGate,
}

impl<S: CheckInStore + 'static> RiskSession<S> {
    pub async fn load(store: Arc<S>, config: EngineConfig) -> Result<Self, SessionError> {
        let history = store.get_all().await?;
        let trajectory = build_risk_trajectory(&history.check_ins, &config);
        let assessment = history
            .check_ins
            .last()
            .map(|latest| assess_risk(latest, &history.check_ins, &config));

        tracing::info!(
            namespace = store.namespace(),
            weeks = history.check_ins.len(),
            journal_entries = history.daily.len(),
            "loaded check-in history"
        );

        let (phase, _) = watch::channel(SubmissionPhase::Idle);
        let preview = PreviewGate::new(config.safety.preview_debounce());

        Ok(Self {
            store,
            config: Arc::new(config),
            classifier: Arc::new(LexiconClassifier),
            enricher: None,
            state: Arc::new(Mutex::new(SessionState {
                check_ins: history.check_ins,
                daily: history.daily,
                assessment,
                trajectory,
                enrichment_round: 0,
                enrichment_running: false,
            })),
            phase: Arc::new(phase),
            preview,
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn ContentEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        self.store.namespace()
    }

    pub fn phase(&self) -> SubmissionPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionPhase> {
        self.phase.subscribe()
    }

    /// Validates, scores and persists a weekly check-in. Returns once the record
    /// is persisted; enrichment of the current week's actions continues in the
    /// background. Submissions for one namespace must be serialized by the caller.
    pub async fn submit_check_in(
        &self,
        input: &CheckInInput,
    ) -> Result<RiskAssessment, SessionError> {
        self.set_phase(SubmissionPhase::Validating);
        let check_in = match input.validate() {
            Ok(check_in) => check_in,
            Err(err) => {
                tracing::warn!(namespace = self.namespace(), error = %err, "rejected check-in");
                self.settle_phase().await;
                return Err(err.into());
            }
        };

        self.set_phase(SubmissionPhase::Scoring);
        let history = self.state.lock().await.check_ins.clone();
        let mut assessment = assess_risk(&check_in, &history, &self.config);

        if let Err(err) = self.store.upsert_by_week(&check_in).await {
            tracing::error!(
                namespace = self.namespace(),
                week = check_in.week,
                error = %err,
                "failed to persist check-in"
            );
            self.settle_phase().await;
            return Err(err.into());
        }

        let (round, current) = {
            let mut state = self.state.lock().await;
            upsert_sorted(&mut state.check_ins, check_in);
            state.trajectory = build_risk_trajectory(&state.check_ins, &self.config);
            // a correction to an earlier week can still change the current week's trend
            let mut current = match state.check_ins.last() {
                Some(latest) if latest.week != assessment.week => {
                    assess_risk(latest, &state.check_ins, &self.config)
                }
                _ => assessment.clone(),
            };
            if self.enricher.is_some() {
                for action in &mut current.actions {
                    action.ai_content = AiContent::Pending;
                }
            }
            state.assessment = Some(current.clone());
            state.enrichment_round += 1;
            state.enrichment_running = self.enricher.is_some();
            (state.enrichment_round, current)
        };
        if current.week == assessment.week {
            assessment = current.clone();
        }
        self.set_phase(SubmissionPhase::Persisted);

        tracing::info!(
            namespace = self.namespace(),
            week = assessment.week,
            level = %assessment.overall_level,
            score = assessment.numeric_risk_score,
            actions = assessment.actions.len(),
            "check-in assessed"
        );

        if let Some(enricher) = &self.enricher {
            self.set_phase(SubmissionPhase::Enriching);
            self.spawn_enrichment(Arc::clone(enricher), round, &current);
        }

        Ok(assessment)
    }

    fn spawn_enrichment(
        &self,
        enricher: Arc<dyn ContentEnricher>,
        round: u64,
        assessment: &RiskAssessment,
    ) {
        let state = Arc::clone(&self.state);
        let phase = Arc::clone(&self.phase);
        let week = assessment.week;
        let requests: Vec<_> = assessment
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| (index, action.action_type, action.description.clone()))
            .collect();

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();
            for (index, action_type, description) in requests {
                let enricher = Arc::clone(&enricher);
                tasks.spawn(async move {
                    let result = enricher.enrich(action_type, &description, week).await;
                    (index, action_type, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (index, result) = match joined {
                    Ok((index, _, Ok(text))) => (index, Ok(text)),
                    Ok((index, action_type, Err(err))) => {
                        tracing::warn!(%action_type, week, error = %err, "action enrichment failed");
                        (index, Err(err.to_string()))
                    }
                    Err(err) => {
                        tracing::warn!(week, error = %err, "action enrichment task aborted");
                        continue;
                    }
                };

                let mut state = state.lock().await;
                if state.enrichment_round != round {
                    continue;
                }
                if let Some(action) = state
                    .assessment
                    .as_mut()
                    .and_then(|assessment| assessment.actions.get_mut(index))
                {
                    action.merge_enrichment(result);
                }
            }

            let mut state = state.lock().await;
            if state.enrichment_round != round {
                tracing::debug!(round, "enrichment round superseded");
                return;
            }
            // tasks that panicked never reported back
            if let Some(assessment) = state.assessment.as_mut() {
                for action in &mut assessment.actions {
                    action.merge_enrichment(Err("enrichment task aborted".to_string()));
                }
            }
            state.enrichment_running = false;
            phase.send_replace(SubmissionPhase::Enriched);
        });
    }

    pub async fn wait_until_settled(&self) {
        let mut receiver = self.phase.subscribe();
        let _ = receiver
            .wait_for(|phase| *phase != SubmissionPhase::Enriching)
            .await;
    }

    /// Classifies and stores a journal entry. A classifier failure degrades the
    /// entry to neutral instead of rejecting it.
    pub async fn submit_daily_check_in(
        &self,
        input: &DailyInput,
    ) -> Result<DailyCheckIn, SessionError> {
        if input.text.trim().is_empty() {
            return Err(ValidationError::new(vec!["text is required".to_string()]).into());
        }

        let classification = match self.classifier.classify(&input.text).await {
            Ok(classification) => classification,
            Err(err) => {
                tracing::warn!(
                    namespace = self.namespace(),
                    error = %err,
                    "sentiment classifier unavailable, recording entry as neutral"
                );
                Classification::neutral()
            }
        };

        let entry = DailyCheckIn {
            id: Uuid::new_v4(),
            date: input.date.unwrap_or_else(Utc::now),
            text: input.text.clone(),
            emoji: input.emoji.clone(),
            sentiment: classification.sentiment,
            confidence_scores: classification.confidence,
            sentiment_score: sentiment_to_score(
                classification.sentiment,
                classification.confidence.as_ref(),
            ),
            emoji_mismatch: check_emoji_mismatch(&input.emoji, classification.sentiment),
            factors: extract_factors(&input.text),
        };

        self.store.append_daily(&entry).await?;

        let alert = {
            let mut state = self.state.lock().await;
            state.daily.push(entry.clone());
            detect_negative_streak(&state.daily, self.config.safety.negative_streak_threshold)
        };

        tracing::info!(
            namespace = self.namespace(),
            sentiment = %entry.sentiment,
            mismatch = entry.emoji_mismatch,
            "journal entry recorded"
        );
        if alert.has_alert {
            tracing::warn!(
                namespace = self.namespace(),
                streak = alert.streak_count,
                "sustained negative journal streak"
            );
        }

        Ok(entry)
    }

    pub async fn preview_sentiment(&self, text: &str) -> Result<Classification, SessionError> {
        self.preview.classify(self.classifier.as_ref(), text).await
    }

    pub async fn safety_alert(&self) -> SafetyAlert {
        let state = self.state.lock().await;
        detect_negative_streak(&state.daily, self.config.safety.negative_streak_threshold)
    }

    pub async fn get_check_in_for_week(&self, week: u32) -> Option<WeeklyCheckIn> {
        let state = self.state.lock().await;
        state.check_ins.iter().find(|c| c.week == week).cloned()
    }

    pub async fn check_ins(&self) -> Vec<WeeklyCheckIn> {
        self.state.lock().await.check_ins.clone()
    }

    pub async fn daily_entries(&self) -> Vec<DailyCheckIn> {
        self.state.lock().await.daily.clone()
    }

    pub async fn latest_assessment(&self) -> Option<RiskAssessment> {
        self.state.lock().await.assessment.clone()
    }

    pub async fn trajectory(&self) -> Vec<RiskTrajectoryPoint> {
        self.state.lock().await.trajectory.clone()
    }

    pub async fn get_doctor_summary(&self) -> Option<String> {
        let state = self.state.lock().await;
        state
            .assessment
            .as_ref()
            .map(|assessment| report::generate_doctor_summary(assessment, &state.check_ins, &self.config))
    }

    pub async fn build_report(&self) -> String {
        let state = self.state.lock().await;
        let alert =
            detect_negative_streak(&state.daily, self.config.safety.negative_streak_threshold);
        report::build_report(
            self.namespace(),
            state.assessment.as_ref(),
            &state.check_ins,
            &alert,
            &self.config,
        )
    }

    pub async fn chat_tone(&self) -> ChatTone {
        let state = self.state.lock().await;
        state
            .assessment
            .as_ref()
            .map_or(RiskLevel::Low, |assessment| assessment.overall_level)
            .into()
    }

    pub async fn clear_history(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        {
            let mut state = self.state.lock().await;
            let round = state.enrichment_round + 1;
            *state = SessionState {
                enrichment_round: round,
                ..SessionState::default()
            };
        }
        self.set_phase(SubmissionPhase::Idle);
        tracing::info!(namespace = self.namespace(), "cleared check-in history");
        Ok(())
    }

    async fn settle_phase(&self) {
        let state = self.state.lock().await;
        self.set_phase(if state.enrichment_running {
            SubmissionPhase::Enriching
        } else {
            SubmissionPhase::Idle
        });
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        self.phase.send_replace(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, StoreError};
    use crate::models::{ActionType, Sentiment};
    use crate::store::{MemoryStore, StoredHistory};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn input(week: i64, swelling: i64, systolic: i64, diastolic: i64) -> CheckInInput {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        CheckInInput {
            week: Some(week),
            date: Some(start + Duration::weeks(week)),
            headache: Some(1),
            swelling: Some(swelling),
            sleep_quality: Some(5),
            fatigue: Some(1),
            mood: Some(5),
            dizziness: Some(1),
            systolic: Some(systolic),
            diastolic: Some(diastolic),
        }
    }

    async fn session() -> RiskSession<MemoryStore> {
        RiskSession::load(Arc::new(MemoryStore::new("test")), EngineConfig::default())
            .await
            .unwrap()
    }

    struct ScriptedEnricher {
        fail_on: ActionType,
        delay: std::time::Duration,
    }

    impl ScriptedEnricher {
        fn failing_on(fail_on: ActionType) -> Self {
            Self {
                fail_on,
                delay: std::time::Duration::from_millis(10),
            }
        }
    }

    #[async_trait]
    impl ContentEnricher for ScriptedEnricher {
        async fn enrich(
            &self,
            action_type: ActionType,
            _description: &str,
            week: u32,
        ) -> Result<String, AnalysisError> {
            if action_type == self.fail_on {
                return Err(AnalysisError::Unavailable("model offline".to_string()));
            }
            tokio::time::sleep(self.delay).await;
            Ok(format!("{action_type} explained for week {week}"))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CheckInStore for BrokenStore {
        fn namespace(&self) -> &str {
            "broken"
        }

        async fn get_all(&self) -> Result<StoredHistory, StoreError> {
            Ok(StoredHistory::default())
        }

        async fn upsert_by_week(&self, _check_in: &WeeklyCheckIn) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn append_daily(&self, _entry: &DailyCheckIn) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct OfflineClassifier;

    #[async_trait]
    impl SentimentClassifier for OfflineClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, AnalysisError> {
            Err(AnalysisError::Unavailable("timeout".to_string()))
        }
    }

    struct FixedClassifier(Sentiment);

    #[async_trait]
    impl SentimentClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, AnalysisError> {
            Ok(Classification {
                sentiment: self.0,
                confidence: None,
            })
        }
    }

    #[tokio::test]
    async fn invalid_check_in_is_rejected_and_not_stored() {
        let session = session().await;
        let mut bad = input(20, 2, 118, 76);
        bad.mood = None;

        let err = session.submit_check_in(&bad).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert!(session.check_ins().await.is_empty());
        assert_eq!(session.phase(), SubmissionPhase::Idle);
    }

    #[tokio::test]
    async fn resubmitting_a_week_is_idempotent() {
        let store = Arc::new(MemoryStore::new("test"));
        let session = RiskSession::load(store.clone(), EngineConfig::default())
            .await
            .unwrap();

        let first = session.submit_check_in(&input(20, 3, 128, 82)).await.unwrap();
        let second = session.submit_check_in(&input(20, 3, 128, 82)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get_all().await.unwrap().check_ins.len(), 1);
        assert_eq!(session.trajectory().await.len(), 1);
        assert_eq!(session.phase(), SubmissionPhase::Persisted);
    }

    #[tokio::test]
    async fn resubmission_replaces_the_stored_week() {
        let session = session().await;
        session.submit_check_in(&input(20, 1, 118, 76)).await.unwrap();
        let updated = session.submit_check_in(&input(20, 5, 145, 95)).await.unwrap();

        assert_eq!(updated.overall_level, RiskLevel::High);
        let stored = session.get_check_in_for_week(20).await.unwrap();
        assert_eq!(stored.swelling, 5);
        assert_eq!(session.chat_tone().await, ChatTone::Compassionate);
    }

    #[tokio::test]
    async fn worsening_weeks_reach_high_and_trajectory_matches() {
        let session = session().await;
        let weeks = [
            (14, 1, 110, 70),
            (16, 2, 118, 74),
            (18, 3, 124, 78),
            (20, 3, 130, 82),
            (22, 4, 135, 85),
        ];
        let mut levels = Vec::new();
        for (week, swelling, sys, dia) in weeks {
            let assessment = session.submit_check_in(&input(week, swelling, sys, dia)).await.unwrap();
            levels.push(assessment.overall_level);
        }

        assert_eq!(levels.last(), Some(&RiskLevel::High));
        let trajectory = session.trajectory().await;
        let replayed: Vec<RiskLevel> = trajectory.iter().map(|p| p.level).collect();
        assert_eq!(replayed, levels);
        assert!(trajectory
            .windows(2)
            .all(|pair| pair[1].numeric_risk_score >= pair[0].numeric_risk_score));

        let summary = session.get_doctor_summary().await.unwrap();
        assert!(summary.starts_with("Gestational week 22: overall risk high"));
    }

    #[tokio::test]
    async fn enrichment_attaches_content_and_isolates_failures() {
        let session = session()
            .await
            .with_enricher(Arc::new(ScriptedEnricher::failing_on(ActionType::BpMonitoring)));

        let returned = session.submit_check_in(&input(28, 4, 142, 92)).await.unwrap();
        assert!(returned
            .actions
            .iter()
            .all(|a| a.ai_content == AiContent::Pending));

        session.wait_until_settled().await;
        assert_eq!(session.phase(), SubmissionPhase::Enriched);

        let enriched = session.latest_assessment().await.unwrap();
        assert_eq!(enriched.overall_level, returned.overall_level);
        for (before, after) in returned.actions.iter().zip(&enriched.actions) {
            assert_eq!(before.description, after.description);
            if after.action_type == ActionType::BpMonitoring {
                assert!(matches!(after.ai_content, AiContent::Failed(_)));
            } else {
                assert_eq!(
                    after.ai_content.text(),
                    Some(format!("{} explained for week 28", after.action_type).as_str())
                );
            }
        }
    }

    #[tokio::test]
    async fn superseded_enrichment_round_is_discarded() {
        let session = session()
            .await
            .with_enricher(Arc::new(ScriptedEnricher::failing_on(ActionType::RoutineCare)));

        session.submit_check_in(&input(30, 4, 118, 76)).await.unwrap();
        session.submit_check_in(&input(31, 4, 118, 76)).await.unwrap();
        session.wait_until_settled().await;

        let latest = session.latest_assessment().await.unwrap();
        assert_eq!(latest.week, 31);
        for action in &latest.actions {
            assert!(action
                .ai_content
                .text()
                .is_some_and(|text| text.ends_with("week 31")));
        }
    }

    #[tokio::test]
    async fn rejected_submission_does_not_hide_running_enrichment() {
        let session = session().await.with_enricher(Arc::new(ScriptedEnricher {
            fail_on: ActionType::RoutineCare,
            delay: std::time::Duration::from_millis(200),
        }));
        session.submit_check_in(&input(20, 4, 118, 76)).await.unwrap();

        let mut bad = input(21, 4, 118, 76);
        bad.week = Some(60);
        assert!(session.submit_check_in(&bad).await.is_err());
        assert_eq!(session.phase(), SubmissionPhase::Enriching);

        session.wait_until_settled().await;
        assert_eq!(session.phase(), SubmissionPhase::Enriched);
        let latest = session.latest_assessment().await.unwrap();
        assert!(latest
            .actions
            .iter()
            .all(|a| a.ai_content != AiContent::Pending));
    }

    #[tokio::test]
    async fn correcting_an_earlier_week_keeps_the_current_week() {
        let session = session()
            .await
            .with_enricher(Arc::new(ScriptedEnricher::failing_on(ActionType::RoutineCare)));
        session.submit_check_in(&input(22, 2, 145, 95)).await.unwrap();
        let corrected = session.submit_check_in(&input(14, 1, 110, 70)).await.unwrap();

        assert_eq!(corrected.week, 14);
        assert!(corrected
            .actions
            .iter()
            .all(|a| a.ai_content == AiContent::NotRequested));

        session.wait_until_settled().await;
        let latest = session.latest_assessment().await.unwrap();
        assert_eq!(latest.week, 22);
        assert_eq!(latest.overall_level, RiskLevel::High);
        assert!(latest.actions.iter().all(|a| a.ai_content.text().is_some()));
        assert_eq!(session.chat_tone().await, ChatTone::Compassionate);
        let summary = session.get_doctor_summary().await.unwrap();
        assert!(summary.starts_with("Gestational week 22"));
    }

    #[tokio::test]
    async fn no_enricher_leaves_content_unrequested() {
        let session = session().await;
        let assessment = session.submit_check_in(&input(12, 1, 110, 70)).await.unwrap();
        assert!(assessment
            .actions
            .iter()
            .all(|a| a.ai_content == AiContent::NotRequested));
        session.wait_until_settled().await;
    }

    #[tokio::test]
    async fn persistence_failure_is_surfaced() {
        let session = RiskSession::load(Arc::new(BrokenStore), EngineConfig::default())
            .await
            .unwrap();
        let err = session.submit_check_in(&input(20, 2, 118, 76)).await.unwrap_err();
        assert!(matches!(err, SessionError::Persistence(_)));
        assert!(session.latest_assessment().await.is_none());
        assert_eq!(session.chat_tone().await, ChatTone::Encouraging);
    }

    #[tokio::test]
    async fn classifier_outage_degrades_to_neutral() {
        let session = session().await.with_classifier(Arc::new(OfflineClassifier));
        let entry = session
            .submit_daily_check_in(&DailyInput {
                text: "Rough night, couldn't sleep".to_string(),
                emoji: "😢".to_string(),
                date: None,
            })
            .await
            .unwrap();
        assert_eq!(entry.sentiment, Sentiment::Neutral);
        assert_eq!(entry.sentiment_score, 0.0);
        assert!(!entry.emoji_mismatch);
        assert_eq!(entry.factors, vec!["sleep"]);
    }

    #[tokio::test]
    async fn negative_streak_alert_clears_after_positive_entry() {
        let session = session()
            .await
            .with_classifier(Arc::new(FixedClassifier(Sentiment::Negative)));
        for day in 1..=4 {
            session
                .submit_daily_check_in(&DailyInput {
                    text: "heavy day".to_string(),
                    emoji: "😊".to_string(),
                    date: Some(Utc.with_ymd_and_hms(2026, 5, day, 21, 0, 0).unwrap()),
                })
                .await
                .unwrap();
        }
        let alert = session.safety_alert().await;
        assert!(alert.has_alert);
        assert_eq!(alert.streak_count, 4);
        assert!(session.daily_entries().await.iter().all(|e| e.emoji_mismatch));

        let session = session.with_classifier(Arc::new(FixedClassifier(Sentiment::Positive)));
        session
            .submit_daily_check_in(&DailyInput {
                text: "lovely walk".to_string(),
                emoji: "😊".to_string(),
                date: Some(Utc.with_ymd_and_hms(2026, 5, 5, 21, 0, 0).unwrap()),
            })
            .await
            .unwrap();
        let alert = session.safety_alert().await;
        assert!(!alert.has_alert);
        assert_eq!(alert.streak_count, 0);
    }

    #[tokio::test]
    async fn blank_journal_text_is_rejected() {
        let session = session().await;
        let err = session
            .submit_daily_check_in(&DailyInput {
                text: "  ".to_string(),
                emoji: "😐".to_string(),
                date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn load_restores_cached_state_and_clear_resets_it() {
        let store = Arc::new(MemoryStore::new("test"));
        {
            let session = RiskSession::load(store.clone(), EngineConfig::default())
                .await
                .unwrap();
            session.submit_check_in(&input(18, 2, 120, 78)).await.unwrap();
            session.submit_check_in(&input(19, 2, 141, 80)).await.unwrap();
        }

        let reloaded = RiskSession::load(store.clone(), EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(reloaded.trajectory().await.len(), 2);
        let latest = reloaded.latest_assessment().await.unwrap();
        assert_eq!(latest.week, 19);
        assert_eq!(latest.overall_level, RiskLevel::High);

        reloaded.clear_history().await.unwrap();
        assert!(reloaded.get_doctor_summary().await.is_none());
        assert!(store.get_all().await.unwrap().check_ins.is_empty());
    }
}
