//! Roadmap Generator: pluggable, trait-based source of roadmap documents.
//!
//! Default: `LlmRoadmapGenerator` (one JSON-only call through `LlmClient`).
//! `AppState` holds an `Arc<dyn RoadmapGenerator>`; tests swap in a fixed one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::ROADMAP_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::roadmap::document::RoadmapDocument;

pub const MAX_TIMELINE_MONTHS: u32 = 24;

// ────────────────────────────────────────────────────────────────────────────
// Request model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationStatus {
    #[serde(rename = "High School")]
    HighSchool,
    #[serde(rename = "Some College")]
    SomeCollege,
    #[serde(rename = "Associate's Degree")]
    AssociateDegree,
    #[serde(rename = "Bachelor's Degree")]
    BachelorDegree,
    #[serde(rename = "Master's Degree")]
    MasterDegree,
    Doctorate,
    Other,
}

impl EducationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EducationStatus::HighSchool => "High School",
            EducationStatus::SomeCollege => "Some College",
            EducationStatus::AssociateDegree => "Associate's Degree",
            EducationStatus::BachelorDegree => "Bachelor's Degree",
            EducationStatus::MasterDegree => "Master's Degree",
            EducationStatus::Doctorate => "Doctorate",
            EducationStatus::Other => "Other",
        }
    }
}

/// The "Generate Plan" form.
#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapRequest {
    pub education_status: EducationStatus,
    pub career_goal: String,
    #[serde(default)]
    pub resources_available: String,
    pub timeline_months: u32,
}

impl RoadmapRequest {
    /// Checks the form and trims the career goal, which becomes part of the storage key.
    pub fn validated(mut self) -> Result<Self, AppError> {
        let goal = self.career_goal.trim();
        if goal.is_empty() {
            return Err(AppError::Validation("career_goal cannot be empty".to_string()));
        }
        self.career_goal = goal.to_string();

        if !(1..=MAX_TIMELINE_MONTHS).contains(&self.timeline_months) {
            return Err(AppError::Validation(format!(
                "timeline_months must be between 1 and {MAX_TIMELINE_MONTHS}"
            )));
        }
        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Produces a roadmap for a validated request. Every failure, whether
/// transport, API or parse, surfaces as `AppError::GenerationFailed`.
#[async_trait]
pub trait RoadmapGenerator: Send + Sync {
    async fn generate(&self, request: &RoadmapRequest) -> Result<RoadmapDocument, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRoadmapGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmRoadmapGenerator {
    llm: LlmClient,
}

impl LlmRoadmapGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RoadmapGenerator for LlmRoadmapGenerator {
    async fn generate(&self, request: &RoadmapRequest) -> Result<RoadmapDocument, AppError> {
        info!(
            "Requesting {}-month roadmap for '{}' from {}",
            request.timeline_months,
            request.career_goal,
            self.llm.model()
        );
        let prompt = build_prompt(request);
        let document = self
            .llm
            .call_json::<RoadmapDocument>(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(failure)?;
        accept_document(document)
    }
}

fn failure(err: LlmError) -> AppError {
    warn!("Roadmap generation failed: {err}");
    AppError::GenerationFailed(err.to_string())
}

pub fn build_prompt(request: &RoadmapRequest) -> String {
    let resources = match request.resources_available.trim() {
        "" => "not specified",
        text => text,
    };
    ROADMAP_PROMPT_TEMPLATE
        .replace("{education_status}", request.education_status.label())
        .replace("{resources_available}", resources)
        .replace("{timeline_months}", &request.timeline_months.to_string())
        .replace("{career_goal}", &request.career_goal)
}

/// A parsed reply is only usable if it has at least one duration.
fn accept_document(document: RoadmapDocument) -> Result<RoadmapDocument, AppError> {
    if document.is_empty() {
        return Err(AppError::GenerationFailed(
            "generated roadmap has an empty timeline".to_string(),
        ));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_reply;
    use serde_json::json;

    fn request() -> RoadmapRequest {
        serde_json::from_value(json!({
            "education_status": "Bachelor's Degree",
            "career_goal": "  AI Engineer ",
            "resources_available": "10 hours per week, budget for online courses",
            "timeline_months": 12
        }))
        .unwrap()
    }

    #[test]
    fn test_validated_trims_goal() {
        let request = request().validated().unwrap();
        assert_eq!(request.career_goal, "AI Engineer");
        assert_eq!(request.education_status, EducationStatus::BachelorDegree);
    }

    #[test]
    fn test_validated_rejects_blank_goal_and_bad_timeline() {
        let mut blank = request();
        blank.career_goal = "   ".to_string();
        assert!(matches!(blank.validated(), Err(AppError::Validation(_))));

        for months in [0, MAX_TIMELINE_MONTHS + 1] {
            let mut r = request();
            r.timeline_months = months;
            assert!(matches!(r.validated(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_unknown_education_status_is_rejected() {
        let parsed = serde_json::from_value::<RoadmapRequest>(json!({
            "education_status": "Bootcamp",
            "career_goal": "Web Developer",
            "timeline_months": 6
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_build_prompt_fills_every_placeholder() {
        let prompt = build_prompt(&request().validated().unwrap());
        assert!(prompt.contains("become a AI Engineer within 12 months"));
        assert!(prompt.contains("Current education status: Bachelor's Degree"));
        assert!(prompt.contains("10 hours per week"));
        for placeholder in [
            "{career_goal}",
            "{timeline_months}",
            "{education_status}",
            "{resources_available}",
        ] {
            assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
        }
    }

    #[test]
    fn test_build_prompt_without_resources() {
        let mut r = request();
        r.resources_available = String::new();
        assert!(build_prompt(&r).contains("skills): not specified"));
    }

    #[test]
    fn test_fenced_reply_parses_into_document() {
        let reply = "```json\n{\"timeline\": {\"Month 1\": {\"Basics\": [\"A\"]}}}\n```";
        let document = parse_json_reply::<RoadmapDocument>(reply).unwrap();
        assert!(accept_document(document).is_ok());
    }

    #[test]
    fn test_empty_timeline_is_a_generation_failure() {
        let document = parse_json_reply::<RoadmapDocument>(r#"{"timeline": {}}"#).unwrap();
        assert!(matches!(
            accept_document(document),
            Err(AppError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_wrong_shape_fails_to_parse() {
        assert!(parse_json_reply::<RoadmapDocument>(r#"{"roadmap": ["a"]}"#).is_err());
    }
}
