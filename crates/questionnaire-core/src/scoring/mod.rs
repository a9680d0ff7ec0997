//! Submission scoring and cohort statistics.
//!
//! Every question is normalised onto 0-100 before weighting so groups with
//! different option ranges stay comparable. Scale answers are read against a
//! fixed ceiling of 5 and number answers against a fixed ceiling of 10,
//! whatever range the question builder configured; choice questions divide
//! by their single highest option value, even for multiple-choice, so a
//! multi-select can score above 100.

mod answer;
mod engine;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use answer::{
    Answer, AnswerError, AnswerScalar, AnswerValue, Response, Submission, SubmissionId,
    SubmissionStatus,
};
pub use engine::{NodeScore, QuestionScore, ScoringEngine, SubmissionScore};
pub use statistics::{
    aggregate_overall, aggregate_scores, CohortStatistics, NodeKey, NodeStatistics,
};

use serde::{Deserialize, Serialize};

use crate::tree::{FormNode, InputType};

pub const SCALE_CEILING: f64 = 5.0;
pub const NUMBER_CEILING: f64 = 10.0;

/// Ceilings shared by live scoring and the template-level maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub scale_ceiling: f64,
    pub number_ceiling: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            scale_ceiling: SCALE_CEILING,
            number_ceiling: NUMBER_CEILING,
        }
    }
}

impl ScoringPolicy {
    /// Raw value a perfect answer reaches, or `None` when the question has no
    /// numeric ceiling (text, unknown input types, choices without a
    /// positive option value).
    pub fn ceiling_for(&self, question: &FormNode) -> Option<f64> {
        match question.input_type.as_ref()? {
            InputType::SingleChoice | InputType::MultipleChoice => question
                .max_option_value()
                .filter(|max| *max > 0.0),
            InputType::Scale => Some(self.scale_ceiling),
            InputType::Number => Some(self.number_ceiling),
            InputType::Text | InputType::Unrecognized(_) => None,
        }
    }
}

/// Score a submission with the default ceilings.
pub fn score_submission(tree: &[FormNode], answers: &[Answer]) -> SubmissionScore {
    ScoringEngine::default().score(tree, answers)
}
