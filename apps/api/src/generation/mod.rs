// Roadmap generation: turns the planning form into a RoadmapDocument.
// All LLM calls go through llm_client.

pub mod generator;
pub mod prompts;
