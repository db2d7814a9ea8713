use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::StoreError;
use crate::models::{CheckInInput, ConfidenceScores, DailyCheckIn, Sentiment, WeeklyCheckIn};
use crate::session::{DailyInput, RiskSession};
use crate::store::{CheckInStore, StoredHistory};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgCheckInStore {
    pool: PgPool,
    namespace: String,
}

impl PgCheckInStore {
    pub fn new(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    fn corrupt(&self, message: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            namespace: self.namespace.clone(),
            message: message.into(),
        }
    }

    fn decode_weekly(&self, row: &PgRow) -> Result<WeeklyCheckIn, StoreError> {
        let input = CheckInInput {
            week: Some(row.try_get::<i32, _>("week")? as i64),
            date: Some(row.try_get("check_in_date")?),
            headache: Some(row.try_get::<i32, _>("headache")? as i64),
            swelling: Some(row.try_get::<i32, _>("swelling")? as i64),
            sleep_quality: Some(row.try_get::<i32, _>("sleep_quality")? as i64),
            fatigue: Some(row.try_get::<i32, _>("fatigue")? as i64),
            mood: Some(row.try_get::<i32, _>("mood")? as i64),
            dizziness: Some(row.try_get::<i32, _>("dizziness")? as i64),
            systolic: Some(row.try_get::<i32, _>("systolic")? as i64),
            diastolic: Some(row.try_get::<i32, _>("diastolic")? as i64),
        };
        input.validate().map_err(|err| self.corrupt(err.to_string()))
    }

    fn decode_daily(&self, row: &PgRow) -> Result<DailyCheckIn, StoreError> {
        let label: String = row.try_get("sentiment")?;
        let sentiment: Sentiment = label.parse().map_err(|err: String| self.corrupt(err))?;

        let positive: Option<f64> = row.try_get("confidence_positive")?;
        let neutral: Option<f64> = row.try_get("confidence_neutral")?;
        let negative: Option<f64> = row.try_get("confidence_negative")?;
        let confidence_scores = match (positive, neutral, negative) {
            (Some(positive), Some(neutral), Some(negative)) => Some(ConfidenceScores {
                positive,
                neutral,
                negative,
            }),
            _ => None,
        };

        Ok(DailyCheckIn {
            id: row.try_get("id")?,
            date: row.try_get("recorded_at")?,
            text: row.try_get("body")?,
            emoji: row.try_get("emoji")?,
            sentiment,
            confidence_scores,
            sentiment_score: row.try_get("sentiment_score")?,
            emoji_mismatch: row.try_get("emoji_mismatch")?,
            factors: row.try_get("factors")?,
        })
    }
}

#[async_trait]
impl CheckInStore for PgCheckInStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_all(&self) -> Result<StoredHistory, StoreError> {
        let weekly_rows = sqlx::query(
            r#"
            SELECT week, check_in_date, headache, swelling, sleep_quality, fatigue,
                   mood, dizziness, systolic, diastolic
            FROM maternal_risk.weekly_check_ins
            WHERE namespace = $1
            ORDER BY week
            "#,
        )
        .bind(&self.namespace)
        .fetch_all(&self.pool)
        .await?;

        let mut check_ins = Vec::with_capacity(weekly_rows.len());
        for row in &weekly_rows {
            check_ins.push(self.decode_weekly(row)?);
        }

        let daily_rows = sqlx::query(
            r#"
            SELECT id, recorded_at, body, emoji, sentiment, confidence_positive,
                   confidence_neutral, confidence_negative, sentiment_score,
                   emoji_mismatch, factors
            FROM maternal_risk.daily_check_ins
            WHERE namespace = $1
            ORDER BY seq
            "#,
        )
        .bind(&self.namespace)
        .fetch_all(&self.pool)
        .await?;

        let mut daily = Vec::with_capacity(daily_rows.len());
        for row in &daily_rows {
            daily.push(self.decode_daily(row)?);
        }

        Ok(StoredHistory {
            current_week: check_ins.last().map(|c| c.week),
            check_ins,
            daily,
        })
    }

    async fn upsert_by_week(&self, check_in: &WeeklyCheckIn) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO maternal_risk.weekly_check_ins
            (namespace, week, check_in_date, headache, swelling, sleep_quality, fatigue,
             mood, dizziness, systolic, diastolic)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (namespace, week) DO UPDATE
            SET check_in_date = EXCLUDED.check_in_date,
                headache = EXCLUDED.headache,
                swelling = EXCLUDED.swelling,
                sleep_quality = EXCLUDED.sleep_quality,
                fatigue = EXCLUDED.fatigue,
                mood = EXCLUDED.mood,
                dizziness = EXCLUDED.dizziness,
                systolic = EXCLUDED.systolic,
                diastolic = EXCLUDED.diastolic,
                updated_at = now()
            "#,
        )
        .bind(&self.namespace)
        .bind(check_in.week as i32)
        .bind(check_in.date)
        .bind(check_in.headache as i32)
        .bind(check_in.swelling as i32)
        .bind(check_in.sleep_quality as i32)
        .bind(check_in.fatigue as i32)
        .bind(check_in.mood as i32)
        .bind(check_in.dizziness as i32)
        .bind(check_in.blood_pressure.systolic as i32)
        .bind(check_in.blood_pressure.diastolic as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_daily(&self, entry: &DailyCheckIn) -> Result<(), StoreError> {
        let confidence = entry.confidence_scores;
        sqlx::query(
            r#"
            INSERT INTO maternal_risk.daily_check_ins
            (id, namespace, recorded_at, body, emoji, sentiment, confidence_positive,
             confidence_neutral, confidence_negative, sentiment_score, emoji_mismatch, factors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(entry.id)
        .bind(&self.namespace)
        .bind(entry.date)
        .bind(&entry.text)
        .bind(&entry.emoji)
        .bind(entry.sentiment.as_str())
        .bind(confidence.map(|c| c.positive))
        .bind(confidence.map(|c| c.neutral))
        .bind(confidence.map(|c| c.negative))
        .bind(entry.sentiment_score)
        .bind(entry.emoji_mismatch)
        .bind(&entry.factors)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM maternal_risk.weekly_check_ins WHERE namespace = $1")
            .bind(&self.namespace)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM maternal_risk.daily_check_ins WHERE namespace = $1")
            .bind(&self.namespace)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Demo history: weeks 14 to 22 with rising pressure and swelling, then a
/// journal with four low days followed by a better one.
pub async fn seed<S: CheckInStore + 'static>(session: &RiskSession<S>) -> anyhow::Result<()> {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).context("invalid date")?;
    let weeks = [
        (14, 1, 110, 70),
        (16, 2, 118, 74),
        (18, 3, 124, 78),
        (20, 3, 130, 82),
        (22, 4, 135, 85),
    ];

    for (week, swelling, systolic, diastolic) in weeks {
        let input = CheckInInput {
            week: Some(week),
            date: Some(start + Duration::weeks(week)),
            headache: Some(1),
            swelling: Some(swelling),
            sleep_quality: Some(4),
            fatigue: Some(2),
            mood: Some(4),
            dizziness: Some(1),
            systolic: Some(systolic),
            diastolic: Some(diastolic),
        };
        session.submit_check_in(&input).await?;
    }

    let journal = [
        ("Felt anxious all day and couldn't sleep", "😟"),
        ("So tired, cried after work", "😢"),
        ("Overwhelmed and lonely this evening", "😔"),
        ("Worried about the scan, exhausted", "😞"),
        ("Lovely walk with my partner, feeling calm and hopeful", "😊"),
    ];
    let first_day = Utc
        .with_ymd_and_hms(2026, 6, 1, 20, 0, 0)
        .single()
        .context("invalid timestamp")?;

    for (offset, (text, emoji)) in journal.into_iter().enumerate() {
        let input = DailyInput {
            text: text.to_string(),
            emoji: emoji.to_string(),
            date: Some(first_day + Duration::days(offset as i64)),
        };
        session.submit_daily_check_in(&input).await?;
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: Vec<(usize, String)>,
}

/// Imports weekly check-ins from CSV with the `CheckInInput` column names.
/// Invalid rows are skipped and reported; rows for an existing week replace it.
pub async fn import_csv<S: CheckInStore>(
    store: &S,
    csv_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<CheckInInput>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                summary.rejected.push((line, err.to_string()));
                continue;
            }
        };
        match row.validate() {
            Ok(check_in) => {
                store.upsert_by_week(&check_in).await?;
                summary.inserted += 1;
            }
            Err(err) => summary.rejected.push((line, err.to_string())),
        }
    }

    tracing::info!(
        namespace = store.namespace(),
        inserted = summary.inserted,
        rejected = summary.rejected.len(),
        "imported check-ins"
    );
    Ok(summary)
}
