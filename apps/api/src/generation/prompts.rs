// Prompt templates for roadmap generation.
// The JSON-only rule is shared via llm_client::prompts.

/// Roadmap prompt. Replace `{career_goal}`, `{timeline_months}`,
/// `{education_status}` and `{resources_available}` before sending.
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"Create a study roadmap for someone who wants to become a {career_goal} within {timeline_months} months.

Current education status: {education_status}
Available resources (time, budget, existing skills): {resources_available}

Split the timeline into consecutive durations (for example "Month 1-2"). For each duration list the topics to study; each topic maps to an ordered list of concrete sub-topics. A topic may instead map to named groups of sub-topics when that reads better. Add a "Resources" entry to each duration listing courses, books or platforms.

Return a JSON object with this shape:
{
  "timeline": {
    "Month 1-2": {
      "Topic 1": ["Sub-topic 1.1", "Sub-topic 1.2"],
      "Topic 2": {"Group A": ["Sub-topic 2.1"], "Group B": ["Sub-topic 2.2"]},
      "Resources": ["Resource 1", "Resource 2"]
    },
    "Month 3-4": {
      "Topic 3": ["Sub-topic 3.1", "Sub-topic 3.2"],
      "Resources": ["Resource 3"]
    }
  }
}

Cover the whole timeline. Every sub-topic must be a short, actionable learning objective."#;
