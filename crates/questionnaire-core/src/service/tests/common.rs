use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::ScoringLimits;
use crate::scoring::{Answer, AnswerValue, Submission, SubmissionId, SubmissionStatus};
use crate::service::{
    questionnaire_router, QuestionnaireService, RepositoryError, ScoreRecord,
    SubmissionRepository, TemplateDraft, TemplateRepository,
};
use crate::tree::{FormNode, InputType, QuestionOption, QuestionnaireTemplate, TemplateId};

pub(super) type MemoryService = QuestionnaireService<MemoryTemplates, MemorySubmissions>;

pub(super) fn tree() -> Vec<FormNode> {
    vec![
        FormNode::group("domain-a", "Attention").with_children(vec![FormNode::question(
            "q1",
            "Follows instructions",
            InputType::SingleChoice,
        )
        .with_weight(2.0)
        .with_options(vec![
            QuestionOption::new("o1", "Rarely", 1.0),
            QuestionOption::new("o5", "Always", 5.0),
        ])]),
        FormNode::group("domain-b", "Regulation").with_children(vec![FormNode::question(
            "q-scale",
            "Calm after transitions",
            InputType::Scale,
        )
        .with_options(
            (1..=5)
                .map(|v| QuestionOption::new(format!("s{v}"), v.to_string(), v as f64))
                .collect(),
        )]),
    ]
}

pub(super) fn draft(id: &str) -> TemplateDraft {
    TemplateDraft {
        id: Some(TemplateId(id.to_string())),
        name: "Classroom observation".to_string(),
        description: None,
        tree: tree(),
    }
}

pub(super) fn duplicate_draft(id: &str) -> TemplateDraft {
    let mut draft = draft(id);
    draft.tree[1].children[0].id = "q1".to_string();
    draft
}

/// q1 answered `o5` (100 x 2) and the scale answered 4 (80 x 1).
pub(super) fn submission(id: &str, template_id: &str) -> Submission {
    submission_with(id, template_id, "o5", 4.0)
}

pub(super) fn submission_with(id: &str, template_id: &str, option: &str, scale: f64) -> Submission {
    Submission {
        id: SubmissionId(id.to_string()),
        questionnaire_id: TemplateId(template_id.to_string()),
        student_id: format!("student-{id}"),
        status: SubmissionStatus::Completed,
        answers: vec![
            Answer::new("q1", AnswerValue::text(option)),
            Answer::new("q-scale", AnswerValue::Number(scale)),
        ],
    }
}

pub(super) fn limits(max_bulk_submissions: usize) -> ScoringLimits {
    ScoringLimits {
        max_bulk_submissions,
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryTemplates>, Arc<MemorySubmissions>) {
    let templates = Arc::new(MemoryTemplates::default());
    let submissions = Arc::new(MemorySubmissions::default());
    let service =
        QuestionnaireService::new(templates.clone(), submissions.clone(), limits(10));
    (service, templates, submissions)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    questionnaire_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryTemplates {
    records: Arc<Mutex<HashMap<TemplateId, QuestionnaireTemplate>>>,
}

impl TemplateRepository for MemoryTemplates {
    fn insert(
        &self,
        template: QuestionnaireTemplate,
    ) -> Result<QuestionnaireTemplate, RepositoryError> {
        let mut guard = self.records.lock().expect("template mutex poisoned");
        if guard.contains_key(&template.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(template.id.clone(), template.clone());
        Ok(template)
    }

    fn update(&self, template: QuestionnaireTemplate) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("template mutex poisoned");
        guard.insert(template.id.clone(), template);
        Ok(())
    }

    fn fetch(&self, id: &TemplateId) -> Result<Option<QuestionnaireTemplate>, RepositoryError> {
        let guard = self.records.lock().expect("template mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySubmissions {
    records: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
    scores: Arc<Mutex<Vec<ScoreRecord>>>,
}

impl MemorySubmissions {
    pub(super) fn seed(&self, submission: Submission) {
        self.records
            .lock()
            .expect("submission mutex poisoned")
            .insert(submission.id.clone(), submission);
    }

    pub(super) fn stored_scores(&self) -> Vec<ScoreRecord> {
        self.scores.lock().expect("score mutex poisoned").clone()
    }
}

impl SubmissionRepository for MemorySubmissions {
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn store_scores(&self, record: ScoreRecord) -> Result<(), RepositoryError> {
        self.scores
            .lock()
            .expect("score mutex poisoned")
            .push(record);
        Ok(())
    }
}

pub(super) struct UnavailableTemplates;

impl TemplateRepository for UnavailableTemplates {
    fn insert(
        &self,
        _template: QuestionnaireTemplate,
    ) -> Result<QuestionnaireTemplate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _template: QuestionnaireTemplate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &TemplateId) -> Result<Option<QuestionnaireTemplate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
