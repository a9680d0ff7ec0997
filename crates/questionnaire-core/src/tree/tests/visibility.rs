use super::common::*;
use crate::scoring::{Answer, AnswerValue};
use crate::tree::{is_visible, visible_question_ids, AnswerIndex, FormNode, InputType};

fn follow_up() -> FormNode {
    FormNode::question("q-follow", "Follow up", InputType::Text).with_condition("Q1", "O1")
}

#[test]
fn unconditional_nodes_are_always_visible() {
    let node = FormNode::question("q", "Plain", InputType::Text);
    let answers: Vec<Answer> = Vec::new();

    assert!(is_visible(&node, &AnswerIndex::new(&answers)));
}

#[test]
fn empty_condition_counts_as_unconditional() {
    let node = FormNode::question("q", "Plain", InputType::Text).with_condition("", "");
    let answers: Vec<Answer> = Vec::new();

    assert!(is_visible(&node, &AnswerIndex::new(&answers)));
}

#[test]
fn conditional_node_follows_parent_answer() {
    let node = follow_up();

    let none: Vec<Answer> = Vec::new();
    assert!(!is_visible(&node, &AnswerIndex::new(&none)));

    let matching = vec![choose("Q1", "O1")];
    assert!(is_visible(&node, &AnswerIndex::new(&matching)));

    let changed = vec![choose("Q1", "O2")];
    assert!(!is_visible(&node, &AnswerIndex::new(&changed)));
}

#[test]
fn multi_select_parent_must_contain_option() {
    let node = follow_up();

    let containing = vec![Answer::new("Q1", AnswerValue::options(["O3", "O1"]))];
    assert!(is_visible(&node, &AnswerIndex::new(&containing)));

    let missing = vec![Answer::new("Q1", AnswerValue::options(["O3"]))];
    assert!(!is_visible(&node, &AnswerIndex::new(&missing)));
}

#[test]
fn numeric_answers_match_numeric_option_ids() {
    let node = FormNode::question("q", "Follow", InputType::Text).with_condition("Q1", "2");

    let answers = vec![Answer::new("Q1", AnswerValue::Number(2.0))];

    assert!(is_visible(&node, &AnswerIndex::new(&answers)));
}

#[test]
fn later_answer_for_same_question_wins() {
    let node = follow_up();
    let answers = vec![choose("Q1", "O1"), choose("Q1", "O2")];

    let index = AnswerIndex::new(&answers);

    assert_eq!(index.len(), 1);
    assert!(!is_visible(&node, &index));
}

#[test]
fn hidden_ancestors_hide_descendants() {
    let tree = vec![FormNode::group("g", "Group").with_children(vec![
        FormNode::question("Q1", "Parent", InputType::SingleChoice),
        FormNode::group("branch", "Branch")
            .with_condition("Q1", "O1")
            .with_children(vec![FormNode::question("inner", "Inner", InputType::Text)]),
    ])];

    let unanswered: Vec<Answer> = Vec::new();
    let visible = visible_question_ids(&tree, &AnswerIndex::new(&unanswered));
    assert!(visible.contains("Q1"));
    assert!(!visible.contains("inner"));

    let answered = vec![choose("Q1", "O1")];
    let visible = visible_question_ids(&tree, &AnswerIndex::new(&answered));
    assert!(visible.contains("inner"));
}

#[test]
fn follow_up_in_fixture_tracks_high_rating() {
    let tree = assessment_tree();

    let low = vec![choose("q-attention", "o-low")];
    assert!(!visible_question_ids(&tree, &AnswerIndex::new(&low)).contains("q-follow"));

    let high = vec![choose("q-attention", "o-high")];
    assert!(visible_question_ids(&tree, &AnswerIndex::new(&high)).contains("q-follow"));
}

#[test]
fn answer_to_hidden_question_does_not_reveal_its_dependents() {
    // q3 is listed before q2 so the chain has to be resolved out of order.
    let tree = vec![FormNode::group("g", "Group").with_children(vec![
        FormNode::question("q1", "First", InputType::SingleChoice),
        FormNode::question("q3", "Third", InputType::Text).with_condition("q2", "x"),
        FormNode::question("q2", "Second", InputType::SingleChoice).with_condition("q1", "a"),
    ])];

    let stale = vec![choose("q1", "b"), choose("q2", "x")];
    let visible = visible_question_ids(&tree, &AnswerIndex::new(&stale));
    assert!(visible.contains("q1"));
    assert!(!visible.contains("q2"));
    assert!(!visible.contains("q3"));

    let live = vec![choose("q1", "a"), choose("q2", "x")];
    let visible = visible_question_ids(&tree, &AnswerIndex::new(&live));
    assert!(visible.contains("q2"));
    assert!(visible.contains("q3"));
}

#[test]
fn conditions_on_unknown_or_cyclic_questions_stay_hidden() {
    let tree = vec![
        FormNode::question("ghost-follow", "Ghost", InputType::Text).with_condition("ghost", "o1"),
        FormNode::question("left", "Left", InputType::Text).with_condition("right", "r"),
        FormNode::question("right", "Right", InputType::Text).with_condition("left", "l"),
    ];
    let answers = vec![choose("ghost", "o1"), choose("left", "l"), choose("right", "r")];

    let visible = visible_question_ids(&tree, &AnswerIndex::new(&answers));

    assert!(visible.is_empty());
}
