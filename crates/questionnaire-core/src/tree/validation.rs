use std::collections::{HashMap, HashSet};

use serde::{Serialize, Serializer};

use super::model::{FormNode, InputType, NodeKind, NodePath};
use super::paths::walk;

/// Structural defect found in a questionnaire tree. The `Display` output is
/// the message shown to the questionnaire author.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("node at path \"{path}\" could not be read: {reason}")]
    Unreadable { path: NodePath, reason: String },
    #[error("node at path \"{path}\" is missing an id")]
    MissingId { path: NodePath },
    #[error("node \"{id}\" at path \"{path}\" has invalid type \"{found}\" (expected \"group\" or \"question\")")]
    InvalidType {
        id: String,
        path: NodePath,
        found: String,
    },
    #[error("duplicate node id \"{id}\" at path \"{path}\"")]
    DuplicateId { id: String, path: NodePath },
    #[error("question \"{id}\" at path \"{path}\" is missing an inputType")]
    MissingInputType { id: String, path: NodePath },
    #[error("question \"{id}\" at path \"{path}\" has invalid inputType \"{found}\" (expected \"single-choice\", \"multiple-choice\", \"scale\", \"number\" or \"text\")")]
    InvalidInputType {
        id: String,
        path: NodePath,
        found: String,
    },
    #[error("question \"{id}\" at path \"{path}\" has an option without an id at position {position}")]
    MissingOptionId {
        id: String,
        path: NodePath,
        position: usize,
    },
    #[error("question \"{id}\" at path \"{path}\" with inputType \"{input_type}\" must have at least one option")]
    MissingOptions {
        id: String,
        path: NodePath,
        input_type: InputType,
    },
    #[error("group \"{id}\" at path \"{path}\" must have a title")]
    MissingGroupTitle { id: String, path: NodePath },
    #[error("node \"{id}\" at path \"{path}\" references non-existent parent question \"{parent_question_id}\"")]
    MissingParentQuestion {
        id: String,
        path: NodePath,
        parent_question_id: String,
    },
    #[error("node \"{id}\" at path \"{path}\" references non-existent parent option \"{parent_option_id}\" on question \"{parent_question_id}\"")]
    MissingParentOption {
        id: String,
        path: NodePath,
        parent_question_id: String,
        parent_option_id: String,
    },
}

impl ValidationError {
    pub fn path(&self) -> &NodePath {
        match self {
            ValidationError::Unreadable { path, .. }
            | ValidationError::MissingId { path }
            | ValidationError::InvalidType { path, .. }
            | ValidationError::DuplicateId { path, .. }
            | ValidationError::MissingInputType { path, .. }
            | ValidationError::InvalidInputType { path, .. }
            | ValidationError::MissingOptionId { path, .. }
            | ValidationError::MissingOptions { path, .. }
            | ValidationError::MissingGroupTitle { path, .. }
            | ValidationError::MissingParentQuestion { path, .. }
            | ValidationError::MissingParentOption { path, .. } => path,
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Report structural defects, parent before children, in document order.
///
/// Never fails: an empty list means the tree is structurally valid. Nodes
/// with defects are still descended into so that problems further down are
/// reported in the same pass.
pub fn validate_structure(tree: &[FormNode]) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for entry in walk(tree) {
        check_node(entry.node, &entry.path, &mut seen_ids, &mut errors);
    }

    errors
}

fn check_node<'a>(
    node: &'a FormNode,
    path: &NodePath,
    seen_ids: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(reason) = &node.unreadable {
        errors.push(ValidationError::Unreadable {
            path: path.clone(),
            reason: reason.clone(),
        });
        return;
    }

    let id = node.path_segment().to_string();

    if node.id.is_empty() {
        errors.push(ValidationError::MissingId { path: path.clone() });
    }

    if let NodeKind::Unrecognized(found) = &node.kind {
        errors.push(ValidationError::InvalidType {
            id: id.clone(),
            path: path.clone(),
            found: found.clone(),
        });
    }

    if !node.id.is_empty() && !seen_ids.insert(node.id.as_str()) {
        errors.push(ValidationError::DuplicateId {
            id: id.clone(),
            path: path.clone(),
        });
    }

    match node.kind {
        NodeKind::Question => match &node.input_type {
            None => errors.push(ValidationError::MissingInputType {
                id,
                path: path.clone(),
            }),
            Some(InputType::Unrecognized(raw)) if raw.trim().is_empty() => {
                errors.push(ValidationError::MissingInputType {
                    id,
                    path: path.clone(),
                })
            }
            Some(InputType::Unrecognized(raw)) => errors.push(ValidationError::InvalidInputType {
                id,
                path: path.clone(),
                found: raw.clone(),
            }),
            Some(input_type) if input_type.requires_options() && node.options.is_empty() => {
                errors.push(ValidationError::MissingOptions {
                    id,
                    path: path.clone(),
                    input_type: input_type.clone(),
                })
            }
            Some(_) => {
                for (position, option) in node.options.iter().enumerate() {
                    if option.id.trim().is_empty() {
                        errors.push(ValidationError::MissingOptionId {
                            id: id.clone(),
                            path: path.clone(),
                            position,
                        });
                    }
                }
            }
        },
        NodeKind::Group => {
            if node.title.trim().is_empty() {
                errors.push(ValidationError::MissingGroupTitle {
                    id,
                    path: path.clone(),
                });
            }
        }
        NodeKind::Unrecognized(_) => {}
    }
}

/// Check that every populated condition points at an existing question and,
/// when an option is named, at one of that question's options.
pub fn validate_conditional_logic(tree: &[FormNode]) -> Vec<ValidationError> {
    let entries: Vec<_> = walk(tree).collect();

    let mut questions: HashMap<&str, &FormNode> = HashMap::new();
    for entry in &entries {
        if entry.node.is_question() && !entry.node.id.is_empty() {
            questions.entry(entry.node.id.as_str()).or_insert(entry.node);
        }
    }

    let mut errors = Vec::new();
    for entry in &entries {
        let Some(condition) = entry.node.active_condition() else {
            continue;
        };

        let Some(parent) = questions.get(condition.parent_question_id.as_str()) else {
            errors.push(ValidationError::MissingParentQuestion {
                id: entry.node.path_segment().to_string(),
                path: entry.path.clone(),
                parent_question_id: condition.parent_question_id.clone(),
            });
            continue;
        };

        if !condition.parent_option_id.is_empty()
            && parent.option(&condition.parent_option_id).is_none()
        {
            errors.push(ValidationError::MissingParentOption {
                id: entry.node.path_segment().to_string(),
                path: entry.path.clone(),
                parent_question_id: condition.parent_question_id.clone(),
                parent_option_id: condition.parent_option_id.clone(),
            });
        }
    }

    errors
}

/// Both validation passes, structure first. Callers reject the save on `Err`.
pub fn validate_template(tree: &[FormNode]) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_structure(tree);
    errors.extend(validate_conditional_logic(tree));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
