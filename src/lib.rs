pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod report;
pub mod risk;
pub mod rules;
pub mod sentiment;
pub mod session;
pub mod store;
pub mod trajectory;

pub use config::EngineConfig;
pub use error::{AnalysisError, SessionError, StoreError, ValidationError};
pub use models::{
    CheckInInput, DailyCheckIn, RiskAssessment, RiskLevel, RiskTrajectoryPoint, SafetyAlert,
    WeeklyCheckIn,
};
pub use report::generate_doctor_summary;
pub use risk::assess_risk;
pub use sentiment::{check_emoji_mismatch, detect_negative_streak, sentiment_to_score};
pub use session::{RiskSession, SubmissionPhase};
pub use trajectory::build_risk_trajectory;
