//! Roadmap document: the generated study plan as it is stored and replayed.
//!
//! The generator returns a weakly-typed tree. Each topic value is classified
//! once, at parse time, into a `TopicValue` variant; traversals match on the
//! variant instead of re-inspecting JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Topic name whose entries are reference material, never trackable leaves.
pub const RESOURCES_TOPIC: &str = "Resources";

/// Topics of one duration, in document order.
pub type Topics = IndexMap<String, TopicValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapDocument {
    /// Duration label (e.g. "Month 1-2") → topics, in document order.
    pub timeline: IndexMap<String, Topics>,
    /// Any other top-level keys, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shape of one topic's value. Variant order matters: serde tries them top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicValue {
    LeafList(Vec<String>),
    GroupedLeaves(IndexMap<String, Vec<String>>),
    /// Anything else. Preserved for round-tripping, skipped by traversal.
    Unrecognized(Value),
}

impl RoadmapDocument {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }
}
