//! Progress projection: turns a roadmap document plus its stored progress map
//! into a checklist with stable leaf ids and aggregate completion.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::roadmap::document::{RoadmapDocument, TopicValue, RESOURCES_TOPIC};

/// Stable identifier of one trackable leaf.
///
/// SHA-256 over a length-prefixed encoding of the leaf's path, so labels may
/// contain any character without two paths colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafId(String);

impl LeafId {
    /// `occurrence` counts identical leaf texts earlier in the same list.
    pub fn derive(path: &[&str], occurrence: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((path.len() as u64).to_be_bytes());
        for segment in path {
            hasher.update((segment.len() as u64).to_be_bytes());
            hasher.update(segment.as_bytes());
        }
        hasher.update((occurrence as u64).to_be_bytes());
        LeafId(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LeafId {
    fn from(value: &str) -> Self {
        LeafId(value.to_string())
    }
}

/// Persisted completion flags. Absent ids mean "not completed".
pub type ProgressMap = BTreeMap<LeafId, bool>;

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub id: LeafId,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeafGroup {
    pub label: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceGroup {
    /// `None` when the resources were a flat list.
    pub label: Option<String>,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopicView {
    Leaves { topic: String, items: Vec<ChecklistItem> },
    Grouped { topic: String, groups: Vec<LeafGroup> },
    Resources { topic: String, groups: Vec<ResourceGroup> },
}

#[derive(Debug, Clone, Serialize)]
pub struct DurationView {
    pub label: String,
    pub topics: Vec<TopicView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    /// `completed / total`; `None` when the roadmap has no trackable items.
    pub percentage: Option<f64>,
}

impl ProgressSummary {
    fn from_counts(completed: usize, total: usize) -> Self {
        let percentage = (total > 0).then(|| completed as f64 / total as f64);
        Self {
            completed,
            total,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub durations: Vec<DurationView>,
    pub summary: ProgressSummary,
}

impl TopicView {
    fn items(&self) -> Box<dyn Iterator<Item = &ChecklistItem> + '_> {
        match self {
            TopicView::Leaves { items, .. } => Box::new(items.iter()),
            TopicView::Grouped { groups, .. } => Box::new(groups.iter().flat_map(|g| g.items.iter())),
            TopicView::Resources { .. } => Box::new(std::iter::empty()),
        }
    }
}

impl Checklist {
    /// Trackable items in document order.
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.durations
            .iter()
            .flat_map(|d| d.topics.iter())
            .flat_map(TopicView::items)
    }
}

/// Walks the document in order and reconciles every leaf with `progress`.
/// Ids in `progress` that no leaf derives are ignored.
pub fn project(document: &RoadmapDocument, progress: &ProgressMap) -> Checklist {
    let mut durations = Vec::with_capacity(document.timeline.len());

    for (duration, topics) in &document.timeline {
        let mut views = Vec::with_capacity(topics.len());

        for (topic, value) in topics {
            let view = if topic == RESOURCES_TOPIC {
                resources_view(topic, value)
            } else {
                match value {
                    TopicValue::LeafList(leaves) => Some(TopicView::Leaves {
                        topic: topic.clone(),
                        items: checklist_items(&[duration, topic], leaves, progress),
                    }),
                    TopicValue::GroupedLeaves(groups) => Some(TopicView::Grouped {
                        topic: topic.clone(),
                        groups: groups
                            .iter()
                            .map(|(group, leaves)| LeafGroup {
                                label: group.clone(),
                                items: checklist_items(&[duration, topic, group], leaves, progress),
                            })
                            .collect(),
                    }),
                    TopicValue::Unrecognized(_) => None,
                }
            };
            views.extend(view);
        }

        durations.push(DurationView {
            label: duration.clone(),
            topics: views,
        });
    }

    let mut checklist = Checklist {
        durations,
        summary: ProgressSummary::from_counts(0, 0),
    };
    let total = checklist.items().count();
    let completed = checklist.items().filter(|item| item.completed).count();
    checklist.summary = ProgressSummary::from_counts(completed, total);
    checklist
}

/// Every leaf id the document currently derives.
pub fn leaf_ids(document: &RoadmapDocument) -> BTreeSet<LeafId> {
    project(document, &ProgressMap::new())
        .items()
        .map(|item| item.id.clone())
        .collect()
}

fn checklist_items(prefix: &[&String], leaves: &[String], progress: &ProgressMap) -> Vec<ChecklistItem> {
    let mut seen: HashMap<&str, usize> = HashMap::new();

    leaves
        .iter()
        .map(|leaf| {
            let occurrence = seen.entry(leaf.as_str()).or_insert(0);
            let mut path: Vec<&str> = prefix.iter().map(|s| s.as_str()).collect();
            path.push(leaf);
            let id = LeafId::derive(&path, *occurrence);
            *occurrence += 1;

            let completed = progress.get(&id).copied().unwrap_or(false);
            ChecklistItem {
                id,
                text: leaf.clone(),
                completed,
            }
        })
        .collect()
}

fn resources_view(topic: &str, value: &TopicValue) -> Option<TopicView> {
    let groups = match value {
        TopicValue::LeafList(entries) => vec![ResourceGroup {
            label: None,
            entries: entries.clone(),
        }],
        TopicValue::GroupedLeaves(groups) => groups
            .iter()
            .map(|(label, entries)| ResourceGroup {
                label: Some(label.clone()),
                entries: entries.clone(),
            })
            .collect(),
        TopicValue::Unrecognized(_) => return None,
    };
    Some(TopicView::Resources {
        topic: topic.to_string(),
        groups,
    })
}
