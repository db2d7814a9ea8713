use std::collections::BTreeSet;

use crate::config::{BloodPressureCutoffs, EngineConfig, RiskBands, SymptomWeights, TrendConfig};
use crate::models::{
    latest_per_week, BloodPressure, BpBand, RiskAssessment, RiskFlag, RiskLevel, Signal,
    SignalContribution, WeeklyCheckIn, MAX_SEVERITY, MIN_SEVERITY,
};
use crate::rules;

/// Scores `current` against the check-ins in `history` that are strictly earlier by week.
///
/// Later or same-week entries in `history` are ignored, so passing the full
/// stored history is safe and gives the same answer as replaying it.
pub fn assess_risk(
    current: &WeeklyCheckIn,
    history: &[WeeklyCheckIn],
    config: &EngineConfig,
) -> RiskAssessment {
    let (weighted_score, contributions) = weighted_score(current, &config.weights);
    let bp_band = blood_pressure_band(&current.blood_pressure, &config.blood_pressure);
    let rising = rising_signals(current, history, &config.trend);
    let trend_escalated = rising
        .as_ref()
        .is_some_and(|signals| signals.len() >= config.trend.min_rising_signals);

    let overall_level = classify_level(weighted_score, bp_band, trend_escalated, &config.risk_bands);

    let mut flags = BTreeSet::new();
    for contribution in &contributions {
        if contribution.severity >= config.symptom_flag_severity.0 {
            if let Some(flag) = RiskFlag::for_symptom(contribution.signal) {
                flags.insert(flag);
            }
        }
    }
    match bp_band {
        BpBand::High => {
            flags.insert(RiskFlag::BloodPressureHigh);
        }
        BpBand::Moderate => {
            flags.insert(RiskFlag::BloodPressureModerate);
        }
        BpBand::Normal => {}
    }
    if trend_escalated {
        flags.insert(RiskFlag::RisingTrend);
    }

    let actions = rules::actions_for(&flags, overall_level);

    RiskAssessment {
        week: current.week,
        generated_at: current.date,
        overall_level,
        weighted_score,
        numeric_risk_score: numeric_risk_score(weighted_score, overall_level, &config.risk_bands),
        blood_pressure: current.blood_pressure,
        bp_band,
        flags,
        contributions,
        trend_escalated,
        actions,
    }
}

pub fn weighted_score(
    check_in: &WeeklyCheckIn,
    weights: &SymptomWeights,
) -> (f64, Vec<SignalContribution>) {
    let total_weight = weights.total();
    let mut contributions: Vec<SignalContribution> = Signal::SYMPTOMS
        .iter()
        .filter_map(|signal| {
            let severity = check_in.risk_severity(*signal)?;
            Some(SignalContribution {
                signal: *signal,
                severity,
                points: severity_points(severity, weights.weight(*signal)) * 100.0 / total_weight,
            })
        })
        .collect();

    contributions.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let score = contributions.iter().map(|c| c.points).sum::<f64>().clamp(0.0, 100.0);
    (score, contributions)
}

pub fn severity_points(severity: u8, weight: f64) -> f64 {
    let span = (MAX_SEVERITY - MIN_SEVERITY) as f64;
    let clamped = severity.clamp(MIN_SEVERITY, MAX_SEVERITY);
    (clamped - MIN_SEVERITY) as f64 / span * weight
}

pub fn blood_pressure_band(reading: &BloodPressure, cutoffs: &BloodPressureCutoffs) -> BpBand {
    if reading.systolic >= cutoffs.high_systolic || reading.diastolic >= cutoffs.high_diastolic {
        BpBand::High
    } else if reading.systolic >= cutoffs.moderate_systolic
        || reading.diastolic >= cutoffs.moderate_diastolic
    {
        BpBand::Moderate
    } else {
        BpBand::Normal
    }
}

/// Signals rising across `current` and its chained prior weeks.
///
/// Returns `None` when there are not enough recent priors to call a trend:
/// fewer than `min_prior_weeks` earlier check-ins, or a gap wider than
/// `max_gap_weeks` inside the window.
pub fn rising_signals(
    current: &WeeklyCheckIn,
    history: &[WeeklyCheckIn],
    trend: &TrendConfig,
) -> Option<Vec<Signal>> {
    let window = prior_chain(current, history, trend);
    if window.len() < trend.min_prior_weeks {
        return None;
    }

    // oldest first, current last
    let mut sequence: Vec<&WeeklyCheckIn> = window.iter().rev().collect();
    sequence.push(current);

    let rising = Signal::ALL
        .iter()
        .copied()
        .filter(|signal| {
            let values: Vec<f64> = sequence.iter().map(|c| c.signal_value(*signal)).collect();
            let non_decreasing = values.windows(2).all(|pair| pair[1] >= pair[0]);
            let net_rise = match (values.first(), values.last()) {
                (Some(first), Some(last)) => last > first,
                _ => false,
            };
            non_decreasing && net_rise
        })
        .collect();

    Some(rising)
}

fn prior_chain(
    current: &WeeklyCheckIn,
    history: &[WeeklyCheckIn],
    trend: &TrendConfig,
) -> Vec<WeeklyCheckIn> {
    let mut priors: Vec<WeeklyCheckIn> = latest_per_week(history)
        .into_iter()
        .filter(|c| c.week < current.week)
        .collect();
    priors.reverse();

    let mut chain = Vec::with_capacity(trend.min_prior_weeks);
    let mut previous_week = current.week;
    for prior in priors {
        if previous_week - prior.week > trend.max_gap_weeks {
            break;
        }
        previous_week = prior.week;
        chain.push(prior);
        if chain.len() == trend.min_prior_weeks {
            break;
        }
    }
    chain
}

pub fn classify_level(
    weighted_score: f64,
    bp_band: BpBand,
    trend_escalated: bool,
    bands: &RiskBands,
) -> RiskLevel {
    let from_score = if weighted_score >= bands.high {
        RiskLevel::High
    } else if weighted_score >= bands.moderate {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let level = from_score.max(bp_band.level_floor());
    if trend_escalated {
        level.escalate()
    } else {
        level
    }
}

pub fn numeric_risk_score(weighted_score: f64, level: RiskLevel, bands: &RiskBands) -> f64 {
    let floor = match level {
        RiskLevel::Low => 0.0,
        RiskLevel::Moderate => bands.moderate,
        RiskLevel::High => bands.high,
    };
    weighted_score.max(floor).clamp(0.0, 100.0)
}
