use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::tree::model::{
    default_graphable, default_weight, graphable_or_default, weight_or_default,
};
use crate::tree::{InputType, NodePath, QuestionOption, TemplateId};

/// Identifier wrapper for submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    Draft,
    InProgress,
    Completed,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::InProgress => "in-progress",
            SubmissionStatus::Completed => "completed",
        }
    }
}

/// A student's answers to one questionnaire template, referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub questionnaire_id: TemplateId,
    pub student_id: String,
    pub status: SubmissionStatus,
    #[serde(default, deserialize_with = "tolerant_answers")]
    pub answers: Vec<Answer>,
}

/// Reads every entry on its own so one malformed answer only affects itself.
fn tolerant_answers<'de, D>(deserializer: D) -> Result<Vec<Answer>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries.into_iter().map(Answer::from_value).collect())
}

/// One recorded answer as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(default)]
    pub node_path: NodePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub answer: AnswerValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_options: Vec<QuestionOption>,
    #[serde(default = "default_weight", deserialize_with = "weight_or_default")]
    pub weight: f64,
    #[serde(default = "default_graphable", deserialize_with = "graphable_or_default")]
    pub graphable: bool,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, answer: AnswerValue) -> Self {
        Self {
            question_id: question_id.into(),
            node_path: NodePath::default(),
            input_type: None,
            answer,
            selected_options: Vec::new(),
            weight: default_weight(),
            graphable: default_graphable(),
        }
    }

    /// Read one answer entry. An entry without the shape of an answer is
    /// kept under an empty question id with its raw payload, which scoring
    /// counts as a skipped answer.
    pub fn from_value(raw: serde_json::Value) -> Self {
        match Answer::deserialize(&raw) {
            Ok(answer) => answer,
            Err(error) => {
                debug!(%error, "answer entry could not be read");
                Self::new("", AnswerValue::Other(raw))
            }
        }
    }

    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    pub fn with_selected_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.selected_options = options;
        self
    }

    /// Value snapshot captured at submission time for a chosen option.
    pub fn selected_option_value(&self, option_id: &str) -> Option<f64> {
        self.selected_options
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.value)
    }
}

/// Raw answer payload: a scalar, a list of scalars, or anything else the
/// client sent. Anything else is kept so one bad answer never rejects the
/// whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<AnswerScalar>),
    Other(serde_json::Value),
}

impl Default for AnswerValue {
    fn default() -> Self {
        AnswerValue::Other(serde_json::Value::Null)
    }
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn options<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::List(
            ids.into_iter()
                .map(|id| AnswerScalar::Text(id.into()))
                .collect(),
        )
    }

    /// Single values must equal the option id; lists must contain it.
    pub fn selects(&self, option_id: &str) -> bool {
        match self {
            AnswerValue::Number(value) => canonical_number(*value) == option_id,
            AnswerValue::Text(value) => value == option_id,
            AnswerValue::List(values) => values.iter().any(|value| value.key() == option_id),
            AnswerValue::Other(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerScalar {
    Number(f64),
    Text(String),
}

impl AnswerScalar {
    /// String form used to compare against option ids.
    pub fn key(&self) -> String {
        match self {
            AnswerScalar::Number(value) => canonical_number(*value),
            AnswerScalar::Text(value) => value.clone(),
        }
    }
}

fn canonical_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Why a raw answer could not be read for its question's input type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerError {
    #[error("answer is empty")]
    Unanswered,
    #[error("{input_type} answer cannot be read from {found}")]
    Shape {
        input_type: InputType,
        found: &'static str,
    },
    #[error("answer \"{raw}\" is not a finite number")]
    NotNumeric { raw: String },
    #[error("input type \"{0}\" is not supported")]
    UnsupportedInputType(String),
}

/// An answer typed by the input type of the question it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    SingleChoice(String),
    MultipleChoice(Vec<String>),
    Scale(f64),
    Number(f64),
    Text(String),
}

impl Response {
    pub fn from_answer(input_type: &InputType, value: &AnswerValue) -> Result<Self, AnswerError> {
        if let AnswerValue::Other(raw) = value {
            return Err(if raw.is_null() {
                AnswerError::Unanswered
            } else {
                AnswerError::Shape {
                    input_type: input_type.clone(),
                    found: json_kind(raw),
                }
            });
        }

        match input_type {
            InputType::SingleChoice => single_option(input_type, value).map(Response::SingleChoice),
            InputType::MultipleChoice => {
                let ids: Vec<String> = match value {
                    AnswerValue::List(values) => values.iter().map(AnswerScalar::key).collect(),
                    AnswerValue::Text(id) => vec![id.clone()],
                    AnswerValue::Number(number) => vec![canonical_number(*number)],
                    AnswerValue::Other(_) => Vec::new(),
                };
                let ids: Vec<String> = ids.into_iter().filter(|id| !id.is_empty()).collect();
                if ids.is_empty() {
                    Err(AnswerError::Unanswered)
                } else {
                    Ok(Response::MultipleChoice(ids))
                }
            }
            InputType::Scale => numeric(input_type, value).map(Response::Scale),
            InputType::Number => numeric(input_type, value).map(Response::Number),
            InputType::Text => match value {
                AnswerValue::Text(text) if text.trim().is_empty() => Err(AnswerError::Unanswered),
                AnswerValue::Text(text) => Ok(Response::Text(text.clone())),
                AnswerValue::Number(number) => Ok(Response::Text(canonical_number(*number))),
                _ => Err(AnswerError::Shape {
                    input_type: input_type.clone(),
                    found: "a list",
                }),
            },
            InputType::Unrecognized(raw) => Err(AnswerError::UnsupportedInputType(raw.clone())),
        }
    }
}

fn single_option(input_type: &InputType, value: &AnswerValue) -> Result<String, AnswerError> {
    let id = match value {
        AnswerValue::Text(id) => id.clone(),
        AnswerValue::Number(number) => canonical_number(*number),
        AnswerValue::List(values) => match values.as_slice() {
            [] => return Err(AnswerError::Unanswered),
            [only] => only.key(),
            _ => {
                return Err(AnswerError::Shape {
                    input_type: input_type.clone(),
                    found: "a list of several options",
                })
            }
        },
        AnswerValue::Other(_) => return Err(AnswerError::Unanswered),
    };

    if id.is_empty() {
        Err(AnswerError::Unanswered)
    } else {
        Ok(id)
    }
}

fn numeric(input_type: &InputType, value: &AnswerValue) -> Result<f64, AnswerError> {
    let number = match value {
        AnswerValue::Number(number) => *number,
        AnswerValue::Text(text) if text.trim().is_empty() => return Err(AnswerError::Unanswered),
        AnswerValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| AnswerError::NotNumeric { raw: text.clone() })?,
        _ => {
            return Err(AnswerError::Shape {
                input_type: input_type.clone(),
                found: "a list",
            })
        }
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(AnswerError::NotNumeric {
            raw: number.to_string(),
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a mixed list",
        serde_json::Value::Object(_) => "an object",
    }
}
