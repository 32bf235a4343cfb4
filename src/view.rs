//! Declarative tree description, independent of any presentation layer.
//!
//! Nodes live in an arena so building, walking and dropping a view never
//! recurses. Serialized, the view is a flat pre-order list where each node
//! names its parent's position.

use crate::linker::{self, Forest};
use crate::parser::{self, ParseError};
use crate::schema::{Payload, PrebuiltNode, Record};
use indextree::{Arena, NodeId};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::info;

/// Everything a presentation layer needs to draw the tree.
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    arena: Arena<ViewNode>,
    roots: Vec<NodeId>,
    /// Records left out because their manager chain never reaches a root.
    pub unreachable: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewNode {
    pub id: String,
    pub title: String,
    /// Hover text, the delegated reviewer when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    /// Absent for the prebuilt variant, which carries no review fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusPair>,
}

/// Own review status and the manager's review status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusPair {
    pub own: String,
    pub manager: String,
}

impl ViewNode {
    fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.to_string(),
            title: title(record),
            tooltip: (!record.delegated_reviewer.is_empty())
                .then(|| record.delegated_reviewer.clone()),
            status: Some(StatusPair {
                own: record.review_status.clone(),
                manager: record.manager_review_status.clone(),
            }),
        }
    }

    fn from_prebuilt(node: &PrebuiltNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.name.clone(),
            tooltip: None,
            status: None,
        }
    }
}

impl TreeView {
    pub fn from_forest(forest: &Forest) -> Self {
        let mut view = Self {
            unreachable: forest.unreachable.len(),
            ..Self::default()
        };
        let mut mapped: HashMap<NodeId, NodeId> = HashMap::with_capacity(forest.len());
        for &root in forest.roots() {
            // Pre-order, so a manager is always mapped before its reports.
            for id in forest.descendants(root) {
                let Some(record) = forest.record(id) else {
                    continue;
                };
                let parent = forest.manager(id).and_then(|m| mapped.get(&m).copied());
                let node = view.push(ViewNode::from_record(record), parent);
                mapped.insert(id, node);
            }
        }
        view
    }

    pub fn from_prebuilt(nodes: &[PrebuiltNode]) -> Self {
        let mut view = Self::default();
        let mut stack: Vec<(&PrebuiltNode, Option<NodeId>)> =
            nodes.iter().rev().map(|node| (node, None)).collect();
        while let Some((node, parent)) = stack.pop() {
            let id = view.push(ViewNode::from_prebuilt(node), parent);
            stack.extend(node.children.iter().rev().map(|child| (child, Some(id))));
        }
        view
    }

    fn push(&mut self, node: ViewNode, parent: Option<NodeId>) -> NodeId {
        let id = self.arena.new_node(node);
        match parent {
            Some(parent) => parent.append(id, &mut self.arena),
            None => self.roots.push(id),
        }
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&ViewNode> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.arena.get(id).and_then(|node| node.first_child()).is_some()
    }

    /// Every node, depth-first, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ViewNode)> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| root.descendants(&self.arena))
            .filter_map(move |id| self.get(id).map(|node| (id, node)))
    }

    pub fn len(&self) -> usize {
        self.arena.count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[derive(Serialize)]
struct FlatTree<'a> {
    nodes: Vec<FlatNode<'a>>,
    #[serde(skip_serializing_if = "is_zero")]
    unreachable: usize,
}

#[derive(Serialize)]
struct FlatNode<'a> {
    #[serde(flatten)]
    node: &'a ViewNode,
    /// Position of the parent in `nodes`, `null` for roots.
    parent: Option<usize>,
    depth: usize,
}

impl Serialize for TreeView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut positions: HashMap<NodeId, (usize, usize)> = HashMap::with_capacity(self.len());
        let mut nodes = Vec::with_capacity(self.len());
        for (id, node) in self.iter() {
            let parent = self.arena[id].parent().and_then(|p| positions.get(&p).copied());
            let depth = parent.map_or(0, |(_, depth)| depth + 1);
            positions.insert(id, (nodes.len(), depth));
            nodes.push(FlatNode {
                node,
                parent: parent.map(|(position, _)| position),
                depth,
            });
        }
        FlatTree {
            nodes,
            unreachable: self.unreachable,
        }
        .serialize(serializer)
    }
}

/// `"{nom} {prenom} ({nomresponsable})"`, the label hosts already show.
fn title(record: &Record) -> String {
    format!(
        "{} {} ({})",
        record.last_name, record.first_name, record.manager_name
    )
}

/// Full parse → link → describe pipeline for one raw `data` value.
pub fn build_view(raw: Option<&str>) -> Result<TreeView, ParseError> {
    let view = match parser::parse_payload(raw)? {
        Payload::Records(records) => {
            let count = records.len();
            let forest = linker::link(records);
            info!(
                "Linked {} records into {} roots ({} unreachable)",
                count,
                forest.roots().len(),
                forest.unreachable.len()
            );
            TreeView::from_forest(&forest)
        }
        Payload::Prebuilt(nodes) => {
            info!("Using prebuilt tree with {} roots", nodes.len());
            TreeView::from_prebuilt(&nodes)
        }
    };
    Ok(view)
}
