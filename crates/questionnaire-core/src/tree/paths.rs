use serde::Serialize;

use super::model::{FormNode, NodeKind, NodePath};
use crate::scoring::ScoringPolicy;

/// One node reached by [`walk`], tagged with its pre-order position.
#[derive(Debug, Clone)]
pub struct WalkEntry<'a> {
    pub index: usize,
    pub parent: Option<usize>,
    pub node: &'a FormNode,
    pub path: NodePath,
}

/// Depth-first, parent-before-children traversal over a forest of nodes.
///
/// Uses an explicit stack so deep trees never recurse on the call stack.
/// `index` is the position of the entry in the traversal and `parent` points
/// at the index of the enclosing node, which lets callers fold results
/// bottom-up by iterating the collected entries in reverse.
pub struct TreeWalk<'a> {
    stack: Vec<(&'a FormNode, Option<usize>, NodePath)>,
    emitted: usize,
}

pub fn walk(tree: &[FormNode]) -> TreeWalk<'_> {
    let stack = tree
        .iter()
        .rev()
        .map(|node| (node, None, NodePath(vec![node.path_segment().to_string()])))
        .collect();
    TreeWalk { stack, emitted: 0 }
}

impl<'a> Iterator for TreeWalk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, parent, path) = self.stack.pop()?;
        let index = self.emitted;
        self.emitted += 1;

        for child in node.children.iter().rev() {
            let child_path = path.child(child.path_segment());
            self.stack.push((child, Some(index), child_path));
        }

        Some(WalkEntry {
            index,
            parent,
            node,
            path,
        })
    }
}

/// A node borrowed from a tree together with its root-to-node path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWithPath<'a> {
    #[serde(flatten)]
    pub node: &'a FormNode,
    pub node_path: NodePath,
}

pub type QuestionWithPath<'a> = NodeWithPath<'a>;

/// Every question in document order, follow-ups under questions included.
pub fn extract_all_questions(tree: &[FormNode]) -> Vec<QuestionWithPath<'_>> {
    walk(tree)
        .filter(|entry| entry.node.is_question())
        .map(|entry| NodeWithPath {
            node: entry.node,
            node_path: entry.path,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePathEntry {
    pub node_id: String,
    pub node_path: NodePath,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
}

pub fn generate_node_paths(tree: &[FormNode]) -> Vec<NodePathEntry> {
    walk(tree)
        .map(|entry| NodePathEntry {
            node_id: entry.node.id.clone(),
            node_path: entry.path,
            node_type: entry.node.kind.clone(),
        })
        .collect()
}

pub fn find_node_by_id<'a>(tree: &'a [FormNode], id: &str) -> Option<NodeWithPath<'a>> {
    walk(tree)
        .find(|entry| entry.node.id == id)
        .map(|entry| NodeWithPath {
            node: entry.node,
            node_path: entry.path,
        })
}

/// Answer-independent summary attached to template responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub total_questions: usize,
    pub total_nodes: usize,
    /// Sum of `ceiling * weight` over graphable questions only. Questions
    /// with `graphable: false` are still scored, so a submission's
    /// `max_score` can exceed this figure.
    pub max_possible_score: f64,
    pub graphable_questions: usize,
}

impl TemplateMetadata {
    pub fn from_tree(tree: &[FormNode]) -> Self {
        Self::with_policy(tree, &ScoringPolicy::default())
    }

    /// `max_possible_score` uses the same ceilings the scoring engine applies,
    /// so a perfect submission to an all-graphable, unconditional template
    /// lands exactly on it.
    pub fn with_policy(tree: &[FormNode], policy: &ScoringPolicy) -> Self {
        let mut metadata = Self {
            total_questions: 0,
            total_nodes: 0,
            max_possible_score: 0.0,
            graphable_questions: 0,
        };

        for entry in walk(tree) {
            metadata.total_nodes += 1;
            if !entry.node.is_question() {
                continue;
            }
            metadata.total_questions += 1;
            if !entry.node.graphable {
                continue;
            }
            metadata.graphable_questions += 1;
            if let Some(ceiling) = policy.ceiling_for(entry.node) {
                metadata.max_possible_score += ceiling * entry.node.weight;
            }
        }

        metadata
    }
}
