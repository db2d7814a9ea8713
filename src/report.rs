use std::fmt::Write;

use crate::config::EngineConfig;
use crate::models::{RiskAssessment, SafetyAlert, Signal, WeeklyCheckIn};
use crate::trajectory::{build_risk_trajectory, trend_direction};

const MAX_SUMMARY_SIGNALS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomSummary {
    pub signal: Signal,
    pub count: usize,
    pub avg_severity: f64,
    pub peak_severity: u8,
}

pub fn summarize_by_symptom(check_ins: &[WeeklyCheckIn]) -> Vec<SymptomSummary> {
    let mut summaries: Vec<SymptomSummary> = Signal::SYMPTOMS
        .iter()
        .filter_map(|signal| {
            let severities: Vec<u8> = check_ins
                .iter()
                .filter_map(|c| c.risk_severity(*signal))
                .collect();
            if severities.is_empty() {
                return None;
            }
            let total: u32 = severities.iter().map(|s| *s as u32).sum();
            Some(SymptomSummary {
                signal: *signal,
                count: severities.len(),
                avg_severity: total as f64 / severities.len() as f64,
                peak_severity: severities.iter().copied().max().unwrap_or_default(),
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.avg_severity
            .partial_cmp(&a.avg_severity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

/// Clinician-facing summary built only from fixed templates.
///
/// `history` is every stored check-in including the one `assessment` was
/// generated for; the trend compares the latest two replayed points.
pub fn generate_doctor_summary(
    assessment: &RiskAssessment,
    history: &[WeeklyCheckIn],
    config: &EngineConfig,
) -> String {
    let trajectory = build_risk_trajectory(history, config);
    let up_to_current: Vec<_> = trajectory
        .into_iter()
        .filter(|point| point.week <= assessment.week)
        .collect();
    let direction = trend_direction(&up_to_current);

    let mut output = String::new();

    let _ = writeln!(
        output,
        "Gestational week {}: overall risk {} (score {:.0}/100).",
        assessment.week, assessment.overall_level, assessment.numeric_risk_score
    );

    let top: Vec<String> = assessment
        .contributions
        .iter()
        .filter(|c| c.points > 0.0)
        .take(MAX_SUMMARY_SIGNALS)
        .map(|c| format!("{} ({}/5)", c.signal.label(), c.severity))
        .collect();
    if top.is_empty() {
        let _ = writeln!(output, "No symptom reported above baseline.");
    } else {
        let _ = writeln!(output, "Main contributing signals: {}.", top.join(", "));
    }

    let _ = writeln!(
        output,
        "Blood pressure {} ({}).",
        assessment.blood_pressure,
        assessment.bp_band.as_str()
    );

    let _ = write!(output, "Trend: {direction}");
    if up_to_current.len() < 2 {
        let _ = write!(output, " (first recorded week)");
    }
    if assessment.trend_escalated {
        let _ = write!(output, "; sustained rise across recent weeks escalated the level");
    }
    let _ = writeln!(output, ".");

    let _ = writeln!(output, "Recommended actions:");
    for action in &assessment.actions {
        match action.ai_content.text() {
            Some(text) => {
                let _ = writeln!(output, "- {} ({})", action.description, text);
            }
            None => {
                let _ = writeln!(output, "- {}", action.description);
            }
        }
    }

    output
}

pub fn build_report(
    namespace: &str,
    assessment: Option<&RiskAssessment>,
    check_ins: &[WeeklyCheckIn],
    alert: &SafetyAlert,
    config: &EngineConfig,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Prenatal Risk Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} weekly check-ins on record)",
        namespace,
        check_ins.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Clinician Summary");

    match assessment {
        Some(assessment) => {
            let _ = write!(output, "{}", generate_doctor_summary(assessment, check_ins, config));
        }
        None => {
            let _ = writeln!(output, "No weekly check-ins recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Symptom Averages");
    let summaries = summarize_by_symptom(check_ins);
    if summaries.is_empty() {
        let _ = writeln!(output, "No symptoms recorded.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: avg {:.1}, peak {} across {} weeks",
                summary.signal.label(),
                summary.avg_severity,
                summary.peak_severity,
                summary.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Trajectory");
    let trajectory = build_risk_trajectory(check_ins, config);
    if trajectory.is_empty() {
        let _ = writeln!(output, "No trajectory yet.");
    } else {
        for point in &trajectory {
            let _ = writeln!(
                output,
                "- week {}: {} ({:.0})",
                point.week, point.level, point.numeric_risk_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Journal Safety");
    if alert.has_alert {
        let _ = writeln!(
            output,
            "{} consecutive negative journal entries. Consider a wellbeing check.",
            alert.streak_count
        );
    } else {
        let _ = writeln!(
            output,
            "No sustained negative streak ({} recent negative entries).",
            alert.streak_count
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiContent, BloodPressure, RiskLevel};
    use crate::risk::assess_risk;
    use chrono::{Duration, NaiveDate};

    fn check_in(week: u32, headache: u8, swelling: u8, systolic: u16, diastolic: u16) -> WeeklyCheckIn {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        WeeklyCheckIn {
            week,
            date: start + Duration::weeks(week as i64),
            headache,
            swelling,
            sleep_quality: 4,
            fatigue: 2,
            mood: 4,
            dizziness: 1,
            blood_pressure: BloodPressure::new(systolic, diastolic),
        }
    }

    #[test]
    fn summary_states_week_level_signals_pressure_and_actions() {
        let config = EngineConfig::default();
        let history = vec![check_in(26, 2, 2, 118, 76), check_in(27, 4, 3, 142, 88)];
        let assessment = assess_risk(&history[1], &history[..1], &config);
        assert_eq!(assessment.overall_level, RiskLevel::High);

        let summary = generate_doctor_summary(&assessment, &history, &config);
        assert!(summary.starts_with("Gestational week 27: overall risk high"));
        assert!(summary.contains("Main contributing signals: headache (4/5), swelling (3/5)"));
        assert!(summary.contains("Blood pressure 142/88 mmHg (high)."));
        assert!(summary.contains("Trend: worsening."));
        for action in &assessment.actions {
            assert!(summary.contains(&action.description));
        }
    }

    #[test]
    fn summary_attaches_ready_explanations_only() {
        let config = EngineConfig::default();
        let current = check_in(28, 2, 4, 142, 92);
        let mut assessment = assess_risk(&current, &[], &config);
        assert!(assessment.actions.len() >= 2);
        assessment.actions[0].ai_content = AiContent::Ready("Call your midwife today.".to_string());
        assessment.actions[1].ai_content = AiContent::Failed("timeout".to_string());

        let summary = generate_doctor_summary(&assessment, &[current], &config);
        let first = format!("- {} (Call your midwife today.)", assessment.actions[0].description);
        assert!(summary.lines().any(|line| line == first));
        let second = format!("- {}", assessment.actions[1].description);
        assert!(summary.lines().any(|line| line == second));
        assert!(!summary.contains("timeout"));
    }

    #[test]
    fn summary_names_at_most_three_signals() {
        let config = EngineConfig::default();
        let mut current = check_in(30, 4, 4, 120, 78);
        current.dizziness = 4;
        current.fatigue = 4;
        let assessment = assess_risk(&current, &[], &config);
        let summary = generate_doctor_summary(&assessment, &[current], &config);
        let line = summary
            .lines()
            .find(|l| l.starts_with("Main contributing signals"))
            .unwrap();
        assert_eq!(line.matches("/5)").count(), 3);
        assert!(summary.contains("(first recorded week)"));
    }

    #[test]
    fn baseline_summary_has_no_contributing_signals() {
        let config = EngineConfig::default();
        let mut current = check_in(10, 1, 1, 110, 70);
        current.sleep_quality = 5;
        current.mood = 5;
        current.fatigue = 1;
        let assessment = assess_risk(&current, &[], &config);
        let summary = generate_doctor_summary(&assessment, &[current], &config);
        assert!(summary.contains("No symptom reported above baseline."));
        assert!(summary.contains("(normal)"));
    }

    #[test]
    fn symptom_summary_orders_worst_first() {
        let history = vec![check_in(20, 1, 4, 118, 76), check_in(21, 2, 5, 118, 76)];
        let summaries = summarize_by_symptom(&history);
        assert_eq!(summaries[0].signal, Signal::Swelling);
        assert_eq!(summaries[0].avg_severity, 4.5);
        assert_eq!(summaries[0].peak_severity, 5);
        assert_eq!(summaries.len(), 6);
    }

    #[test]
    fn report_handles_empty_history() {
        let alert = SafetyAlert {
            has_alert: false,
            streak_count: 0,
            recent_negative: Vec::new(),
        };
        let report = build_report("demo", None, &[], &alert, &EngineConfig::default());
        assert!(report.contains("No weekly check-ins recorded yet."));
        assert!(report.contains("No trajectory yet."));
        assert!(report.contains("No sustained negative streak"));
    }
}
