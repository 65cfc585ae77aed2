//! Category hierarchy reconstruction.
//!
//! Assembly-group facets arrive as a flat list of nodes linked by
//! `parentNodeId`. [`Classification`] indexes that list once and walks a
//! single chain from the root, taking the first-listed child at every
//! level. Sibling branches are dropped: every article gets exactly one
//! category path.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::extract::{self, is_present, scalar_to_string};

/// Separator between labels in a rendered category path.
pub const PATH_SEPARATOR: &str = " > ";

/// Separator between node ids.
pub const ID_SEPARATOR: &str = "|";

// ---------------------------------------------------------------------------
// CategoryPath
// ---------------------------------------------------------------------------

/// Root-to-leaf labels and their parallel node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPath {
    pub labels: Vec<String>,
    pub ids: Vec<String>,
}

impl CategoryPath {
    /// A single-level path, skipping whichever half is empty.
    pub fn single(label: impl Into<String>, id: impl Into<String>) -> Self {
        let (label, id) = (label.into(), id.into());
        Self {
            labels: if label.is_empty() { vec![] } else { vec![label] },
            ids: if id.is_empty() { vec![] } else { vec![id] },
        }
    }

    /// Labels joined with `" > "`.
    pub fn path(&self) -> String {
        self.labels.join(PATH_SEPARATOR)
    }

    /// Ids joined with `"|"`.
    pub fn node_ids(&self) -> String {
        self.ids.join(ID_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.ids.is_empty()
    }

    /// Fill whichever joined half is still empty from `other`.
    pub fn or_else(mut self, other: impl FnOnce() -> CategoryPath) -> Self {
        let (no_path, no_ids) = (self.path().is_empty(), self.node_ids().is_empty());
        if no_path || no_ids {
            let other = other();
            if no_path {
                self.labels = other.labels;
            }
            if no_ids {
                self.ids = other.ids;
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ClassificationNode
// ---------------------------------------------------------------------------

/// One entry of the facet `counts` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationNode {
    pub id: Option<String>,
    /// `None` when `parentNodeId` is absent or null.
    pub parent_id: Option<String>,
    pub label: String,
    pub raw: Value,
}

impl ClassificationNode {
    pub fn from_value(raw: &Value) -> Self {
        let source = extract::object(raw);
        let id = source
            .get("assemblyGroupNodeId")
            .filter(|v| is_present(v))
            .map(scalar_to_string);
        let parent_id = source
            .get("parentNodeId")
            .filter(|v| !v.is_null())
            .map(scalar_to_string);
        let label = source
            .get("assemblyGroupName")
            .map(scalar_to_string)
            .unwrap_or_default();

        Self {
            id,
            parent_id,
            label,
            raw: raw.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Indexed flat node list.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    nodes: Vec<ClassificationNode>,
    /// Node id to node index; later duplicates overwrite earlier ones.
    by_id: HashMap<String, usize>,
    /// Parent id to the index of its first-listed child.
    first_child: HashMap<String, usize>,
}

impl Classification {
    pub fn new(nodes: Vec<ClassificationNode>) -> Self {
        let mut by_id = HashMap::new();
        let mut first_child = HashMap::new();

        for (index, node) in nodes.iter().enumerate() {
            if let Some(id) = &node.id {
                by_id.insert(id.clone(), index);
            }
            if let Some(parent) = &node.parent_id {
                first_child.entry(parent.clone()).or_insert(index);
            }
        }

        Self {
            nodes,
            by_id,
            first_child,
        }
    }

    /// Index an `assemblyGroupFacets` object (its `counts` list).
    pub fn from_facets(facets: &Value) -> Self {
        Self::new(
            extract::list(facets, "counts")
                .iter()
                .map(ClassificationNode::from_value)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ClassificationNode> {
        self.by_id.get(id).map(|&index| &self.nodes[index])
    }

    /// The first listed node without a parent.
    pub fn root(&self) -> Option<&ClassificationNode> {
        self.nodes.iter().find(|node| node.parent_id.is_none())
    }

    /// The first listed child of the node with `id`.
    pub fn first_child(&self, id: &str) -> Option<&ClassificationNode> {
        self.first_child.get(id).map(|&index| &self.nodes[index])
    }

    /// Walk root to leaf along first children.
    ///
    /// Empty when there are no nodes, no root, or the walk revisits a node.
    #[instrument(skip_all, fields(nodes = self.nodes.len()))]
    pub fn category_path(&self) -> CategoryPath {
        let Some(root_index) = self.nodes.iter().position(|n| n.parent_id.is_none()) else {
            if !self.nodes.is_empty() {
                debug!("no root node in facets");
            }
            return CategoryPath::default();
        };

        let mut path = CategoryPath::default();
        let mut visited = HashSet::new();
        let mut current = root_index;

        loop {
            if !visited.insert(current) {
                warn!(
                    node = ?self.nodes[current].id,
                    "cycle in category parent links, dropping path"
                );
                return CategoryPath::default();
            }

            let node = &self.nodes[current];
            path.labels.push(node.label.clone());
            path.ids.push(node.id.clone().unwrap_or_default());

            let Some(id) = node.id.as_deref() else { break };
            match self.first_child.get(id) {
                Some(&child) => current = child,
                None => break,
            }
        }

        path
    }
}

/// Category path of an `assemblyGroupFacets` object.
pub fn from_facets(facets: &Value) -> CategoryPath {
    Classification::from_facets(facets).category_path()
}

// ---------------------------------------------------------------------------
// Pre-ordered group lists
// ---------------------------------------------------------------------------

/// Join groups that already arrive in hierarchy order.
fn join_groups(groups: &[Value], label_key: &str, id_key: &str) -> CategoryPath {
    let mut path = CategoryPath::default();
    for group in groups.iter().map(extract::object) {
        if let Some(label) = group.get(label_key).filter(|v| is_present(v)) {
            path.labels.push(scalar_to_string(label));
        }
        if let Some(id) = group.get(id_key).filter(|v| is_present(v)) {
            path.ids.push(scalar_to_string(id));
        }
    }
    path
}

/// Category of an article's nested `assemblyGroups` (`description`/`id`).
pub fn from_assembly_groups(groups: &[Value]) -> CategoryPath {
    join_groups(groups, "description", "id")
}

/// Category from vehicle linkage entries.
pub fn from_linkages(linkages: &[Value]) -> CategoryPath {
    join_groups(linkages, "assemblyGroupDescription", "assemblyGroupNodeId")
}

// ---------------------------------------------------------------------------
// ClassificationSummary
// ---------------------------------------------------------------------------

/// Generic article and category as reported by the classification endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub generic_article_id: String,
    pub generic_article_description: String,
    pub category: CategoryPath,
}

impl ClassificationSummary {
    /// Accepts the list shape (`array` / `data.array`, first entry used) and
    /// the direct shape (`genericArticle` at top level).
    pub fn from_response(response: &Value) -> Self {
        let entry = match extract::response_rows(response).first() {
            Some(first) => first,
            None if response.get("genericArticle").is_some() => response,
            None => return Self::default(),
        };

        let generic = entry.get("genericArticle").map(extract::object);
        let field = |key: &str| {
            generic
                .and_then(|g| g.get(key))
                .map(scalar_to_string)
                .unwrap_or_default()
        };

        Self {
            generic_article_id: field("id"),
            generic_article_description: field("description"),
            category: from_assembly_groups(extract::list(entry, "assemblyGroups")),
        }
    }
}
