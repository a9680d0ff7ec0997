use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::answer::{Answer, AnswerError, Response};
use super::ScoringPolicy;
use crate::tree::paths::{walk, WalkEntry};
use crate::tree::visibility::{applicability, AnswerIndex};
use crate::tree::{FormNode, InputType, NodePath};

/// Score of one answered question. Text questions carry no numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question_id: String,
    pub node_path: NodePath,
    pub title: String,
    pub input_type: InputType,
    pub raw_score: Option<f64>,
    pub max_score: Option<f64>,
    pub normalized_score: Option<f64>,
    pub weight: f64,
    pub weighted_score: Option<f64>,
    pub graphable: bool,
}

impl QuestionScore {
    pub fn is_scored(&self) -> bool {
        self.normalized_score.is_some()
    }
}

/// Aggregate for one group node, on the same 0-100 scale as its questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeScore {
    pub node_id: String,
    pub node_path: NodePath,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub weighted_score: f64,
    pub total_weight: f64,
    pub details: Vec<QuestionScore>,
}

/// Result of scoring one submission against its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionScore {
    pub overall_score: f64,
    /// Sum of `ceiling * weight` over every scored answer, graphable or not.
    /// Unlike `TemplateMetadata::max_possible_score` it follows what was
    /// actually answered and visible.
    pub max_score: f64,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub weighted_score: f64,
    pub total_weight: f64,
    pub node_scores: Vec<NodeScore>,
    pub skipped_answers: usize,
}

impl SubmissionScore {
    pub fn node(&self, node_id: &str) -> Option<&NodeScore> {
        self.node_scores.iter().find(|score| score.node_id == node_id)
    }

    pub fn question(&self, question_id: &str) -> Option<&QuestionScore> {
        self.node_scores
            .iter()
            .flat_map(|node| node.details.iter())
            .find(|detail| detail.question_id == question_id)
    }
}

/// Reasons an answer is left out of both numerator and denominator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum SkipReason {
    #[error("question is not part of the template")]
    Orphaned,
    #[error("question is hidden by its condition")]
    NotApplicable,
    #[error("question declares no input type")]
    MissingInputType,
    #[error("answer was recorded as {recorded} but the question is now {current}")]
    StaleInputType {
        recorded: InputType,
        current: InputType,
    },
    #[error("option \"{0}\" is not offered by the question")]
    UnknownOption(String),
    #[error("question has no option with a positive value")]
    NoOptionMaximum,
    #[error("question weight is not a finite number")]
    InvalidWeight,
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    answered: usize,
    total: usize,
    weighted: f64,
    weight: f64,
    max: f64,
}

impl Tally {
    fn absorb(&mut self, other: &Tally) {
        self.answered += other.answered;
        self.total += other.total;
        self.weighted += other.weighted;
        self.weight += other.weight;
        self.max += other.max;
    }

    fn score(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted / self.weight
        } else {
            0.0
        }
    }
}

/// Stateless scorer applying a [`ScoringPolicy`] to submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score one submission against the live template tree.
    ///
    /// Answers that cannot be scored are dropped from both the numerator and
    /// the denominator; they never abort the rest of the tree.
    pub fn score(&self, tree: &[FormNode], answers: &[Answer]) -> SubmissionScore {
        let entries: Vec<WalkEntry<'_>> = walk(tree).collect();
        let index = AnswerIndex::new(answers);
        let applicable = applicability(&entries, &index);

        let mut skipped = 0usize;
        let mut own = vec![Tally::default(); entries.len()];
        let mut details: Vec<Option<QuestionScore>> = vec![None; entries.len()];

        for (position, entry) in entries.iter().enumerate() {
            if !entry.node.is_question() {
                continue;
            }
            let answer = index.get(&entry.node.id);

            if !applicable[position] {
                if answer.is_some() {
                    skipped += 1;
                    log_skip(&entry.node.id, &SkipReason::NotApplicable);
                }
                continue;
            }

            own[position].total = 1;
            let Some(answer) = answer else {
                continue;
            };

            match self.score_question(entry, answer) {
                Ok(score) => {
                    let tally = &mut own[position];
                    tally.answered = 1;
                    if let (Some(weighted), Some(max)) = (score.weighted_score, score.max_score) {
                        tally.weighted = weighted;
                        tally.weight = score.weight;
                        tally.max = max * score.weight;
                    }
                    details[position] = Some(score);
                }
                Err(AnswerIgnored::Unanswered) => {}
                Err(AnswerIgnored::Skipped(reason)) => {
                    skipped += 1;
                    log_skip(&entry.node.id, &reason);
                }
            }
        }

        let known: HashSet<&str> = entries
            .iter()
            .filter(|entry| entry.node.is_question())
            .map(|entry| entry.node.id.as_str())
            .collect();
        for answer in answers {
            if !known.contains(answer.question_id.as_str()) {
                skipped += 1;
                log_skip(&answer.question_id, &SkipReason::Orphaned);
            }
        }

        let ends = subtree_ends(&entries);
        let node_scores = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.node.is_group())
            .map(|(position, entry)| {
                let range = position + 1..ends[position];
                let mut tally = Tally::default();
                for tallied in &own[range.clone()] {
                    tally.absorb(tallied);
                }
                NodeScore {
                    node_id: entry.node.id.clone(),
                    node_path: entry.path.clone(),
                    title: entry.node.title.clone(),
                    score: tally.score(),
                    max_score: tally.max,
                    answered_questions: tally.answered,
                    total_questions: tally.total,
                    weighted_score: tally.weighted,
                    total_weight: tally.weight,
                    details: details[range].iter().flatten().cloned().collect(),
                }
            })
            .collect();

        let mut overall = Tally::default();
        for tallied in &own {
            overall.absorb(tallied);
        }

        SubmissionScore {
            overall_score: overall.score(),
            max_score: overall.max,
            answered_questions: overall.answered,
            total_questions: overall.total,
            weighted_score: overall.weighted,
            total_weight: overall.weight,
            node_scores,
            skipped_answers: skipped,
        }
    }

    /// Score independent submissions of one template in parallel. Output
    /// order follows input order.
    pub fn score_batch<A>(&self, tree: &[FormNode], batch: &[A]) -> Vec<SubmissionScore>
    where
        A: AsRef<[Answer]> + Sync,
    {
        batch
            .par_iter()
            .map(|answers| self.score(tree, answers.as_ref()))
            .collect()
    }

    fn score_question(
        &self,
        entry: &WalkEntry<'_>,
        answer: &Answer,
    ) -> Result<QuestionScore, AnswerIgnored> {
        let question = entry.node;
        let input_type = question
            .input_type
            .clone()
            .ok_or(SkipReason::MissingInputType)?;

        if let Some(recorded) = &answer.input_type {
            if *recorded != input_type {
                return Err(SkipReason::StaleInputType {
                    recorded: recorded.clone(),
                    current: input_type,
                }
                .into());
            }
        }

        if !question.weight.is_finite() {
            return Err(SkipReason::InvalidWeight.into());
        }

        let response = Response::from_answer(&input_type, &answer.answer)?;
        let measured = match response {
            Response::SingleChoice(id) => {
                let max = self.option_ceiling(question)?;
                Some((option_value(question, answer, &id)?, max))
            }
            Response::MultipleChoice(ids) => {
                let max = self.option_ceiling(question)?;
                let mut raw = 0.0;
                for id in &ids {
                    raw += option_value(question, answer, id)?;
                }
                Some((raw, max))
            }
            Response::Scale(value) => Some((value, self.policy.scale_ceiling)),
            Response::Number(value) => Some((value, self.policy.number_ceiling)),
            Response::Text(_) => None,
        };

        let (raw_score, max_score, normalized_score, weighted_score) = match measured {
            Some((raw, max)) => {
                let normalized = raw / max * 100.0;
                (
                    Some(raw),
                    Some(max),
                    Some(normalized),
                    Some(normalized * question.weight),
                )
            }
            None => (None, None, None, None),
        };

        Ok(QuestionScore {
            question_id: question.id.clone(),
            node_path: entry.path.clone(),
            title: question.title.clone(),
            input_type,
            raw_score,
            max_score,
            normalized_score,
            weight: question.weight,
            weighted_score,
            graphable: question.graphable,
        })
    }

    fn option_ceiling(&self, question: &FormNode) -> Result<f64, SkipReason> {
        self.policy
            .ceiling_for(question)
            .ok_or(SkipReason::NoOptionMaximum)
    }
}

/// Unanswered questions are simply not counted; everything else is a skip.
enum AnswerIgnored {
    Unanswered,
    Skipped(SkipReason),
}

impl From<SkipReason> for AnswerIgnored {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::Answer(AnswerError::Unanswered) => AnswerIgnored::Unanswered,
            other => AnswerIgnored::Skipped(other),
        }
    }
}

impl From<AnswerError> for AnswerIgnored {
    fn from(error: AnswerError) -> Self {
        SkipReason::from(error).into()
    }
}

/// The value snapshot stored with the answer wins over the template option.
fn option_value(question: &FormNode, answer: &Answer, option_id: &str) -> Result<f64, SkipReason> {
    answer
        .selected_option_value(option_id)
        .or_else(|| question.option(option_id).map(|option| option.value))
        .filter(|value| value.is_finite())
        .ok_or_else(|| SkipReason::UnknownOption(option_id.to_string()))
}

/// Exclusive end of each entry's subtree within the pre-order listing.
fn subtree_ends(entries: &[WalkEntry<'_>]) -> Vec<usize> {
    let mut sizes = vec![1usize; entries.len()];
    for position in (0..entries.len()).rev() {
        if let Some(parent) = entries[position].parent {
            sizes[parent] += sizes[position];
        }
    }
    sizes
        .iter()
        .enumerate()
        .map(|(position, size)| position + size)
        .collect()
}

fn log_skip(question_id: &str, reason: &SkipReason) {
    debug!(question_id, %reason, "answer excluded from scoring");
}
