use crate::scoring::{Answer, AnswerValue};
use crate::tree::{FormNode, InputType, QuestionOption};

/// Two domains, a nested group, and a conditional follow-up under a question.
pub(super) fn assessment_tree() -> Vec<FormNode> {
    vec![
        FormNode::group("domain-a", "Attention").with_children(vec![
            FormNode::question("q-attention", "Stays on task", InputType::SingleChoice)
                .with_weight(2.0)
                .with_options(vec![
                    QuestionOption::new("o-low", "Rarely", 1.0),
                    QuestionOption::new("o-high", "Usually", 5.0),
                ])
                .with_children(vec![FormNode::question(
                    "q-follow",
                    "Describe the strategies that help",
                    InputType::Text,
                )
                .with_condition("q-attention", "o-high")]),
            FormNode::group("sub-b", "Focus").with_children(vec![
                FormNode::question("q-scale", "Focus during lessons", InputType::Scale)
                    .with_options(scale_options()),
                FormNode::question("q-count", "Breaks needed per hour", InputType::Number),
            ]),
        ]),
        FormNode::group("domain-c", "Social").with_children(vec![
            FormNode::question("q-multi", "Plays with", InputType::MultipleChoice).with_options(
                vec![
                    QuestionOption::new("m1", "Alone", 1.0),
                    QuestionOption::new("m2", "One friend", 2.0),
                    QuestionOption::new("m3", "Groups", 3.0),
                ],
            ),
            FormNode::question("q-notes", "Notes", InputType::Text),
        ]),
    ]
}

pub(super) fn scale_options() -> Vec<QuestionOption> {
    (1..=5)
        .map(|value| QuestionOption::new(format!("s{value}"), value.to_string(), value as f64))
        .collect()
}

pub(super) fn choose(question_id: &str, option_id: &str) -> Answer {
    Answer::new(question_id, AnswerValue::text(option_id))
}
