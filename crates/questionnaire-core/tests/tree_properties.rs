use proptest::prelude::*;
use questionnaire_core::scoring::{Answer, AnswerValue, ScoringEngine};
use questionnaire_core::tree::{
    extract_all_questions, generate_node_paths, validate_structure, validate_template,
    visible_question_ids, AnswerIndex, FormNode, InputType, QuestionOption, TemplateMetadata,
    ValidationError,
};

#[derive(Debug, Clone)]
enum Shape {
    Question(u8),
    Group(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0u8..5).prop_map(Shape::Question);
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Shape::Group)
    })
}

fn forest() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(shape(), 0..6)
}

fn build(shapes: &[Shape], next_id: &mut usize) -> Vec<FormNode> {
    shapes
        .iter()
        .map(|shape| {
            *next_id += 1;
            let id = format!("n{next_id}");
            match shape {
                Shape::Group(children) => {
                    let children = build(children, next_id);
                    FormNode::group(id.clone(), format!("Group {id}")).with_children(children)
                }
                Shape::Question(kind) => question(id, *kind),
            }
        })
        .collect()
}

fn question(id: String, kind: u8) -> FormNode {
    let choices = vec![
        QuestionOption::new("o1", "Low", 1.0),
        QuestionOption::new("o2", "High", 3.0),
    ];
    match kind {
        0 => FormNode::question(id, "Single", InputType::SingleChoice).with_options(choices),
        1 => FormNode::question(id, "Multiple", InputType::MultipleChoice).with_options(choices),
        2 => FormNode::question(id, "Scale", InputType::Scale).with_options(
            (1..=5)
                .map(|v| QuestionOption::new(format!("s{v}"), v.to_string(), v as f64))
                .collect(),
        ),
        3 => FormNode::question(id, "Number", InputType::Number),
        _ => FormNode::question(id, "Text", InputType::Text),
    }
}

fn tree_of(shapes: &[Shape]) -> Vec<FormNode> {
    let mut next_id = 0;
    build(shapes, &mut next_id)
}

fn count(shapes: &[Shape]) -> (usize, usize) {
    shapes.iter().fold((0, 0), |(nodes, questions), shape| match shape {
        Shape::Question(_) => (nodes + 1, questions + 1),
        Shape::Group(children) => {
            let (n, q) = count(children);
            (nodes + 1 + n, questions + q)
        }
    })
}

fn last_node_mut(nodes: &mut [FormNode]) -> Option<&mut FormNode> {
    let last = nodes.last_mut()?;
    if last.children.is_empty() {
        Some(last)
    } else {
        last_node_mut(&mut last.children)
    }
}

/// The highest-valued answer for every question in the tree.
fn perfect_answers(tree: &[FormNode]) -> Vec<Answer> {
    extract_all_questions(tree)
        .into_iter()
        .map(|question| {
            let id = question.node.id.clone();
            let value = match question.node.input_type {
                Some(InputType::SingleChoice) => AnswerValue::text("o2"),
                Some(InputType::MultipleChoice) => AnswerValue::options(["o2"]),
                Some(InputType::Scale) => AnswerValue::Number(5.0),
                Some(InputType::Number) => AnswerValue::Number(10.0),
                _ => AnswerValue::text("observed"),
            };
            Answer::new(id, value)
        })
        .collect()
}

proptest! {
    #[test]
    fn extraction_counts_match_tree_shape(shapes in forest()) {
        let tree = tree_of(&shapes);
        let (nodes, questions) = count(&shapes);

        prop_assert_eq!(extract_all_questions(&tree).len(), questions);

        let paths = generate_node_paths(&tree);
        prop_assert_eq!(paths.len(), nodes);
        for entry in &paths {
            prop_assert_eq!(entry.node_path.segments().last(), Some(&entry.node_id));
        }
    }

    #[test]
    fn generated_trees_are_valid(shapes in forest()) {
        let tree = tree_of(&shapes);

        prop_assert!(validate_structure(&tree).is_empty());
        prop_assert!(validate_template(&tree).is_ok());
    }

    #[test]
    fn one_duplicate_yields_one_error(shapes in forest()) {
        let (nodes, _) = count(&shapes);
        prop_assume!(nodes >= 2);

        let mut tree = tree_of(&shapes);
        let first = tree[0].id.clone();
        if let Some(last) = last_node_mut(&mut tree) {
            last.id = first.clone();
        }

        let errors = validate_structure(&tree);
        prop_assert_eq!(errors.len(), 1);
        let is_duplicate = matches!(&errors[0], ValidationError::DuplicateId { id, .. } if *id == first);
        prop_assert!(is_duplicate);
    }

    #[test]
    fn unconditional_questions_are_all_visible(shapes in forest()) {
        let tree = tree_of(&shapes);
        let (_, questions) = count(&shapes);

        let answers: Vec<Answer> = Vec::new();
        let visible = visible_question_ids(&tree, &AnswerIndex::new(&answers));

        prop_assert_eq!(visible.len(), questions);
    }

    #[test]
    fn perfect_answers_reach_the_ceiling(shapes in forest()) {
        let tree = tree_of(&shapes);
        let answers = perfect_answers(&tree);

        let score = ScoringEngine::default().score(&tree, &answers);
        let metadata = TemplateMetadata::from_tree(&tree);

        prop_assert!((score.max_score - metadata.max_possible_score).abs() < 1e-9);
        if score.total_weight > 0.0 {
            prop_assert!((score.overall_score - 100.0).abs() < 1e-9);
        } else {
            prop_assert_eq!(score.overall_score, 0.0);
        }
        for node in &score.node_scores {
            prop_assert!(node.score == 0.0 || (node.score - 100.0).abs() < 1e-9);
        }
        prop_assert_eq!(score.skipped_answers, 0);
    }
}
