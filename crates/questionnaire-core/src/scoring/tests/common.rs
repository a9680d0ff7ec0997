use crate::scoring::{Answer, AnswerValue, NodeScore};
use crate::tree::{FormNode, InputType, NodePath, QuestionOption};

pub(super) fn domain_a() -> FormNode {
    FormNode::group("domain-a", "Domain A").with_children(vec![FormNode::question(
        "q1",
        "Follows instructions",
        InputType::SingleChoice,
    )
    .with_weight(2.0)
    .with_options(vec![
        QuestionOption::new("o1", "Rarely", 1.0),
        QuestionOption::new("o5", "Always", 5.0),
    ])])
}

pub(super) fn scoring_tree() -> Vec<FormNode> {
    vec![
        domain_a(),
        FormNode::group("domain-b", "Regulation").with_children(vec![
            FormNode::question("q-scale", "Calm after transitions", InputType::Scale)
                .with_options(
                    (1..=5)
                        .map(|v| QuestionOption::new(format!("s{v}"), v.to_string(), v as f64))
                        .collect(),
                ),
            FormNode::question("q-number", "Outbursts per week", InputType::Number),
            FormNode::group("sub", "Peers").with_children(vec![
                FormNode::question("q-multi", "Plays with", InputType::MultipleChoice)
                    .with_options(vec![
                        QuestionOption::new("m1", "Alone", 1.0),
                        QuestionOption::new("m2", "One friend", 2.0),
                        QuestionOption::new("m3", "Groups", 3.0),
                    ]),
                FormNode::question("q-text", "Observations", InputType::Text),
            ]),
        ]),
    ]
}

pub(super) fn full_answers() -> Vec<Answer> {
    vec![
        choose("q1", "o5"),
        Answer::new("q-scale", AnswerValue::Number(4.0)),
        Answer::new("q-number", AnswerValue::Number(5.0)),
        Answer::new("q-multi", AnswerValue::options(["m3"])),
        Answer::new("q-text", AnswerValue::text("settles with a timer")),
    ]
}

pub(super) fn choose(question_id: &str, option_id: &str) -> Answer {
    Answer::new(question_id, AnswerValue::text(option_id))
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn node_score(node_id: &str, score: f64) -> NodeScore {
    NodeScore {
        node_id: node_id.to_string(),
        node_path: NodePath(vec![node_id.to_string()]),
        title: node_id.to_uppercase(),
        score,
        max_score: 0.0,
        answered_questions: 0,
        total_questions: 0,
        weighted_score: 0.0,
        total_weight: 0.0,
        details: Vec::new(),
    }
}
