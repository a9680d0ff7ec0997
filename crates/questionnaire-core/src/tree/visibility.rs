use std::collections::{HashMap, HashSet};

use super::model::FormNode;
use super::paths::{walk, WalkEntry};
use crate::scoring::Answer;

/// Answers of one submission keyed by question id.
///
/// When a submission carries more than one answer for a question the last
/// one recorded wins.
#[derive(Debug, Clone, Default)]
pub struct AnswerIndex<'a> {
    by_question: HashMap<&'a str, &'a Answer>,
}

impl<'a> AnswerIndex<'a> {
    pub fn new(answers: &'a [Answer]) -> Self {
        answers.iter().collect()
    }

    pub fn get(&self, question_id: &str) -> Option<&'a Answer> {
        self.by_question.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_question.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_question.is_empty()
    }
}

impl<'a> FromIterator<&'a Answer> for AnswerIndex<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Answer>>(iter: I) -> Self {
        let by_question = iter
            .into_iter()
            .map(|answer| (answer.question_id.as_str(), answer))
            .collect();
        Self { by_question }
    }
}

/// Whether a node's own condition is satisfied by the recorded answers.
///
/// Unconditional nodes are always visible. A conditional node needs an
/// answer to its parent question that equals (single value) or contains
/// (multi-select) the referenced option; without that answer it stays hidden.
pub fn is_visible(node: &FormNode, answers: &AnswerIndex<'_>) -> bool {
    let Some(condition) = node.active_condition() else {
        return true;
    };

    answers
        .get(&condition.parent_question_id)
        .map(|parent| parent.answer.selects(&condition.parent_option_id))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Pending,
    InProgress,
    Resolved(bool),
}

/// Per-entry applicability for a pre-order walk.
///
/// A node applies when its enclosing node applies and its own condition is
/// met. A condition is only met by the answer of a parent question that
/// itself applies, so answers left behind on hidden questions never reveal
/// their dependents. Conditions may point forward in document order; chains
/// are resolved on an explicit stack, and a node caught in a cycle of
/// conditions does not apply.
pub(crate) fn applicability(entries: &[WalkEntry<'_>], answers: &AnswerIndex<'_>) -> Vec<bool> {
    let mut questions: HashMap<&str, usize> = HashMap::new();
    for (position, entry) in entries.iter().enumerate() {
        if entry.node.is_question() && !entry.node.id.is_empty() {
            questions.entry(entry.node.id.as_str()).or_insert(position);
        }
    }

    let mut state = vec![Resolution::Pending; entries.len()];
    let mut stack = Vec::new();

    for start in 0..entries.len() {
        if state[start] != Resolution::Pending {
            continue;
        }
        stack.push(start);

        while let Some(&position) = stack.last() {
            if let Resolution::Resolved(_) = state[position] {
                stack.pop();
                continue;
            }

            let entry = &entries[position];
            let condition = entry.node.active_condition();
            let target = condition
                .and_then(|condition| questions.get(condition.parent_question_id.as_str()))
                .copied();

            if state[position] == Resolution::Pending {
                let waiting: Vec<usize> = [entry.parent, target]
                    .into_iter()
                    .flatten()
                    .filter(|dependency| state[*dependency] == Resolution::Pending)
                    .collect();
                if !waiting.is_empty() {
                    state[position] = Resolution::InProgress;
                    stack.extend(waiting);
                    continue;
                }
            }

            let applies = |dependency: usize| state[dependency] == Resolution::Resolved(true);
            let enclosing = entry.parent.map_or(true, applies);
            let condition_met = match (condition, target) {
                (None, _) => true,
                (Some(_), Some(target)) => applies(target) && is_visible(entry.node, answers),
                (Some(_), None) => false,
            };

            state[position] = Resolution::Resolved(enclosing && condition_met);
            stack.pop();
        }
    }

    state
        .into_iter()
        .map(|resolution| resolution == Resolution::Resolved(true))
        .collect()
}

/// Ids of the questions that currently apply to a submission.
pub fn visible_question_ids<'a>(tree: &'a [FormNode], answers: &AnswerIndex<'_>) -> HashSet<&'a str> {
    let entries: Vec<_> = walk(tree).collect();
    let applicable = applicability(&entries, answers);

    entries
        .iter()
        .zip(applicable)
        .filter(|(entry, applies)| *applies && entry.node.is_question())
        .map(|(entry, _)| entry.node.id.as_str())
        .collect()
}
