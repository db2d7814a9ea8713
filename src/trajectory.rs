use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{latest_per_week, RiskTrajectoryPoint, WeeklyCheckIn};
use crate::risk::assess_risk;

/// Score movement smaller than this between the last two points reads as stable.
pub const STABLE_BAND: f64 = 2.5;

/// Replays every check-in against only the weeks before it, ascending by week.
///
/// Each point matches what `assess_risk` returned when that week was submitted,
/// as long as no earlier week was edited afterwards.
pub fn build_risk_trajectory(
    check_ins: &[WeeklyCheckIn],
    config: &EngineConfig,
) -> Vec<RiskTrajectoryPoint> {
    let ordered = latest_per_week(check_ins);
    ordered
        .iter()
        .enumerate()
        .map(|(index, check_in)| {
            let assessment = assess_risk(check_in, &ordered[..index], config);
            RiskTrajectoryPoint::from(&assessment)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Worsening => "worsening",
        };
        f.write_str(label)
    }
}

/// Direction between the latest two points. A level change always counts,
/// otherwise the numeric score has to move past `STABLE_BAND`.
pub fn trend_direction(points: &[RiskTrajectoryPoint]) -> TrendDirection {
    let [.., previous, latest] = points else {
        return TrendDirection::Stable;
    };

    if latest.level > previous.level {
        return TrendDirection::Worsening;
    }
    if latest.level < previous.level {
        return TrendDirection::Improving;
    }

    let delta = latest.numeric_risk_score - previous.numeric_risk_score;
    if delta > STABLE_BAND {
        TrendDirection::Worsening
    } else if delta < -STABLE_BAND {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    }
}
