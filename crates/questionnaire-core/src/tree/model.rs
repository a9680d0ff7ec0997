use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Recursive questionnaire node. Groups and questions share one shape; the
/// `type` discriminant decides which of the question-only fields matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormNode {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_weight", deserialize_with = "weight_or_default")]
    pub weight: f64,
    #[serde(default = "default_graphable", deserialize_with = "graphable_or_default")]
    pub graphable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(
        default,
        deserialize_with = "tolerant_nodes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<FormNode>,
    /// Set when the node's document could not be read; holds the reason.
    #[serde(skip)]
    pub unreadable: Option<String>,
}

pub(crate) fn default_weight() -> f64 {
    1.0
}

pub(crate) fn default_graphable() -> bool {
    true
}

/// An explicit `null` weight reads the same as an absent one.
pub(crate) fn weight_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(default_weight))
}

/// Reads every node on its own so one malformed node only affects itself.
pub(crate) fn tolerant_nodes<'de, D>(deserializer: D) -> Result<Vec<FormNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries.into_iter().map(FormNode::from_value).collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn graphable_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_graphable))
}

impl FormNode {
    pub fn group(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Group,
            title: title.into(),
            description: None,
            weight: default_weight(),
            graphable: default_graphable(),
            preferred_chart_type: None,
            input_type: None,
            options: Vec::new(),
            condition: None,
            children: Vec::new(),
            unreadable: None,
        }
    }

    /// Read one node entry. A node that cannot be read keeps its id, when it
    /// has one, and the reason so the structure validator can report it.
    pub fn from_value(raw: serde_json::Value) -> Self {
        match FormNode::deserialize(&raw) {
            Ok(node) => node,
            Err(error) => {
                let id = raw
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                Self {
                    kind: NodeKind::Unrecognized(String::new()),
                    unreadable: Some(error.to_string()),
                    ..Self::group(id, "")
                }
            }
        }
    }

    pub fn question(id: impl Into<String>, title: impl Into<String>, input_type: InputType) -> Self {
        Self {
            kind: NodeKind::Question,
            input_type: Some(input_type),
            ..Self::group(id, title)
        }
    }

    pub fn with_children(mut self, children: Vec<FormNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_condition(
        mut self,
        parent_question_id: impl Into<String>,
        parent_option_id: impl Into<String>,
    ) -> Self {
        self.condition = Some(Condition {
            parent_question_id: parent_question_id.into(),
            parent_option_id: parent_option_id.into(),
        });
        self
    }

    pub fn is_question(&self) -> bool {
        self.kind == NodeKind::Question
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Id used when rendering paths; nodes without one read as `undefined`.
    pub fn path_segment(&self) -> &str {
        if self.id.is_empty() {
            "undefined"
        } else {
            &self.id
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Largest declared option value, if any option carries a finite value.
    pub fn max_option_value(&self) -> Option<f64> {
        self.options
            .iter()
            .map(|option| option.value)
            .filter(|value| value.is_finite())
            .fold(None, |max, value| match max {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }

    /// Condition with at least one populated reference.
    pub fn active_condition(&self) -> Option<&Condition> {
        self.condition
            .as_ref()
            .filter(|condition| !condition.is_empty())
    }
}

/// Node discriminant. Strings other than `group`/`question` are kept so the
/// structure validator can name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Group,
    Question,
    Unrecognized(String),
}

impl NodeKind {
    pub fn label(&self) -> &str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Question => "question",
            NodeKind::Unrecognized(raw) => raw,
        }
    }
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Unrecognized(String::new())
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "group" => NodeKind::Group,
            "question" => NodeKind::Question,
            _ => NodeKind::Unrecognized(value),
        }
    }
}

impl From<NodeKind> for String {
    fn from(value: NodeKind) -> Self {
        match value {
            NodeKind::Unrecognized(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a question collects its answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    SingleChoice,
    MultipleChoice,
    Scale,
    Number,
    Text,
    Unrecognized(String),
}

impl InputType {
    pub fn label(&self) -> &str {
        match self {
            InputType::SingleChoice => "single-choice",
            InputType::MultipleChoice => "multiple-choice",
            InputType::Scale => "scale",
            InputType::Number => "number",
            InputType::Text => "text",
            InputType::Unrecognized(raw) => raw,
        }
    }

    /// Input types that cannot be answered without a declared option list.
    pub fn requires_options(&self) -> bool {
        matches!(
            self,
            InputType::SingleChoice | InputType::MultipleChoice | InputType::Scale
        )
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, InputType::SingleChoice | InputType::MultipleChoice)
    }
}

impl From<String> for InputType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "single-choice" => InputType::SingleChoice,
            "multiple-choice" => InputType::MultipleChoice,
            "scale" => InputType::Scale,
            "number" => InputType::Number,
            "text" => InputType::Text,
            _ => InputType::Unrecognized(value),
        }
    }
}

impl From<InputType> for String {
    fn from(value: InputType) -> Self {
        match value {
            InputType::Unrecognized(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selectable answer; `value` is what choosing it is worth. A missing id
/// reads as empty so the structure validator can report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: f64,
}

impl QuestionOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value,
        }
    }
}

/// Makes a node applicable only when a parent question picked an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub parent_question_id: String,
    #[serde(default)]
    pub parent_option_id: String,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.parent_question_id.is_empty() && self.parent_option_id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Radar,
    Gauge,
    Pie,
}

/// Ordered ancestor ids from the root down to (and including) a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(pub Vec<String>);

impl NodePath {
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        f.write_str(&self.0.join(" > "))
    }
}

impl From<Vec<String>> for NodePath {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// Identifier wrapper for questionnaire templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A versioned questionnaire. The template owns its whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "initial_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "tolerant_nodes")]
    pub tree: Vec<FormNode>,
}

fn initial_version() -> u32 {
    1
}
