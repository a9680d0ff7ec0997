//! Questionnaire tree model and the pure traversals built on it.

pub mod model;
pub mod paths;
pub mod validation;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use model::{
    ChartType, Condition, FormNode, InputType, NodeKind, NodePath, QuestionOption,
    QuestionnaireTemplate, TemplateId,
};
pub use paths::{
    extract_all_questions, find_node_by_id, generate_node_paths, walk, NodePathEntry,
    NodeWithPath, QuestionWithPath, TemplateMetadata, TreeWalk, WalkEntry,
};
pub use validation::{
    validate_conditional_logic, validate_structure, validate_template, ValidationError,
};
pub use visibility::{is_visible, visible_question_ids, AnswerIndex};
