/// The generation-request pipeline
///
/// Composes cache lookup, quota check, generation invocation (with fallback),
/// persistence and usage accounting into a single request flow.
pub mod cache;
pub mod fallback;
pub mod fingerprint;
pub mod generator;
pub mod orchestrator;
pub mod quota;
pub mod store;

pub use cache::ResultCache;
pub use generator::{RemoteGenerator, StrategyGenerator};
pub use orchestrator::{GenerationOrchestrator, StrategyOutcome};
pub use quota::QuotaLedger;
pub use store::{StrategyFeedback, StrategyRecord, StrategyStore};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A content-strategy generation request
///
/// Immutable once received; used only to derive a cache fingerprint and to
/// invoke generation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StrategyInput {
    #[validate(length(min = 10, max = 500, message = "Goal must be 10-500 characters"))]
    pub goal: String,

    #[validate(length(min = 5, max = 200, message = "Audience must be 5-200 characters"))]
    pub audience: String,

    #[validate(length(min = 3, max = 100, message = "Industry must be 3-100 characters"))]
    pub industry: String,

    #[validate(length(min = 3, max = 50, message = "Platform must be 3-50 characters"))]
    pub platform: String,

    #[serde(default = "default_content_type", rename = "contentType")]
    #[validate(length(max = 50, message = "Content type too long"))]
    pub content_type: String,
}

fn default_content_type() -> String {
    "Mixed Content".to_string()
}

/// An audience persona
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub age_range: String,
    pub occupation: String,
    pub pain_points: Vec<String>,
    pub desires: Vec<String>,
    pub content_preferences: Vec<String>,
}

/// A gap competitors leave open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorGap {
    pub gap: String,
    pub impact: String,
    pub implementation: String,
}

/// An SEO keyword recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub intent: String,
    pub difficulty: String,
    pub priority: u8,
    pub hashtags: Vec<String>,
}

/// Posting schedule guidance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingSchedule {
    pub best_days: Vec<String>,
    pub best_times: Vec<String>,
    pub frequency: String,
}

/// Strategic guidance section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicGuidance {
    pub what_to_do: Vec<String>,
    pub how_to_do_it: Vec<String>,
    pub primary_platform: String,
    pub when_to_post: PostingSchedule,
    pub things_to_avoid: Vec<String>,
}

/// A content-calendar entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub week: u8,
    pub day: u8,
    pub topic: String,
    pub format: String,
    pub caption_hook: String,
    pub cta: String,
}

/// A ready-to-post sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePost {
    pub title: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub best_time: String,
}

/// ROI projection ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiPrediction {
    pub traffic_lift_percentage: String,
    pub engagement_boost_percentage: String,
    pub estimated_monthly_reach: String,
    pub time_to_results: String,
}

/// The structured result produced by the generation collaborator (or the
/// deterministic fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub personas: Vec<Persona>,
    pub competitor_gaps: Vec<CompetitorGap>,
    pub keywords: Vec<Keyword>,
    pub strategic_guidance: StrategicGuidance,
    pub calendar: Vec<CalendarEntry>,
    pub sample_posts: Vec<SamplePost>,
    pub roi_prediction: RoiPrediction,
}
