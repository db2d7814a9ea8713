use std::collections::BTreeSet;

use crate::models::{ActionType, RiskFlag, RiskLevel, SystemAction};

#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    Flag(RiskFlag),
    Level(RiskLevel),
}

#[derive(Debug, Clone, Copy)]
pub struct ActionRule {
    pub trigger: Trigger,
    pub action_type: ActionType,
    pub description: &'static str,
}

const fn rule(trigger: Trigger, action_type: ActionType, description: &'static str) -> ActionRule {
    ActionRule {
        trigger,
        action_type,
        description,
    }
}

/// Evaluated top to bottom; the first rule to fire for an action type supplies its description.
pub const ACTION_RULES: &[ActionRule] = &[
    rule(
        Trigger::Flag(RiskFlag::BloodPressureHigh),
        ActionType::AppointmentFlag,
        "Your blood pressure is in the high range. Contact your maternity care provider today to review it.",
    ),
    rule(
        Trigger::Level(RiskLevel::High),
        ActionType::AppointmentFlag,
        "This week's check-in shows a high risk pattern. Contact your maternity care provider within 24 hours.",
    ),
    rule(
        Trigger::Flag(RiskFlag::BloodPressureHigh),
        ActionType::BpMonitoring,
        "Recheck your blood pressure twice a day, seated and rested, and log every reading.",
    ),
    rule(
        Trigger::Flag(RiskFlag::BloodPressureModerate),
        ActionType::BpMonitoring,
        "Recheck your blood pressure daily this week at the same time of day and log each reading.",
    ),
    rule(
        Trigger::Flag(RiskFlag::RisingTrend),
        ActionType::SymptomWatch,
        "Several signals have been rising over recent weeks. Note any changes and raise them at your next appointment.",
    ),
    rule(
        Trigger::Flag(RiskFlag::Headache),
        ActionType::SymptomWatch,
        "Track when headaches start and how long they last. A headache with blurred vision needs prompt medical attention.",
    ),
    rule(
        Trigger::Flag(RiskFlag::Swelling),
        ActionType::NutritionAdjust,
        "Ease swelling by limiting salty foods, drinking water through the day and resting with your feet raised.",
    ),
    rule(
        Trigger::Flag(RiskFlag::Fatigue),
        ActionType::NutritionAdjust,
        "Add iron-rich foods such as leafy greens, beans and lean meat, and ask about an iron check at your next visit.",
    ),
    rule(
        Trigger::Flag(RiskFlag::Dizziness),
        ActionType::HydrationCheck,
        "Drink water regularly, stand up slowly and sit down straight away if you feel lightheaded.",
    ),
    rule(
        Trigger::Flag(RiskFlag::PoorSleep),
        ActionType::SleepSupport,
        "Try a consistent wind-down routine and sleeping on your side with a pillow between your knees.",
    ),
    rule(
        Trigger::Flag(RiskFlag::LowMood),
        ActionType::CommunitySuggest,
        "Reach out to a peer support group or someone you trust this week. Low mood in pregnancy is common and treatable.",
    ),
];

pub const ROUTINE_CARE: &str =
    "Keep up your weekly check-ins and routine prenatal appointments.";

impl Trigger {
    fn fires(&self, flags: &BTreeSet<RiskFlag>, level: RiskLevel) -> bool {
        match self {
            Trigger::Flag(flag) => flags.contains(flag),
            Trigger::Level(required) => level == *required,
        }
    }
}

pub fn actions_for(flags: &BTreeSet<RiskFlag>, level: RiskLevel) -> Vec<SystemAction> {
    let mut actions: Vec<SystemAction> = Vec::new();

    for rule in ACTION_RULES {
        if !rule.trigger.fires(flags, level) {
            continue;
        }
        if actions.iter().any(|a| a.action_type == rule.action_type) {
            continue;
        }
        actions.push(SystemAction::new(rule.action_type, rule.description));
    }

    if actions.is_empty() {
        actions.push(SystemAction::new(ActionType::RoutineCare, ROUTINE_CARE));
    }

    actions
}
