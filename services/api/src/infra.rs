use metrics_exporter_prometheus::PrometheusHandle;
use questionnaire_core::error::AppError;
use questionnaire_core::scoring::{Submission, SubmissionId};
use questionnaire_core::service::{
    RepositoryError, ScoreRecord, ServiceError, SubmissionRepository, TemplateRepository,
};
use questionnaire_core::tree::{validate_template, QuestionnaireTemplate, TemplateId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} store poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTemplateRepository {
    records: Arc<Mutex<HashMap<TemplateId, QuestionnaireTemplate>>>,
}

impl TemplateRepository for InMemoryTemplateRepository {
    fn insert(
        &self,
        template: QuestionnaireTemplate,
    ) -> Result<QuestionnaireTemplate, RepositoryError> {
        let mut guard = lock(&self.records, "template")?;
        if guard.contains_key(&template.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(template.id.clone(), template.clone());
        Ok(template)
    }

    fn update(&self, template: QuestionnaireTemplate) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "template")?;
        if guard.contains_key(&template.id) {
            guard.insert(template.id.clone(), template);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &TemplateId) -> Result<Option<QuestionnaireTemplate>, RepositoryError> {
        let guard = lock(&self.records, "template")?;
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionRepository {
    records: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
    scores: Arc<Mutex<HashMap<SubmissionId, ScoreRecord>>>,
}

impl InMemorySubmissionRepository {
    pub(crate) fn insert(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "submission")?;
        guard.insert(submission.id.clone(), submission);
        Ok(())
    }
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = lock(&self.records, "submission")?;
        Ok(guard.get(id).cloned())
    }

    fn store_scores(&self, record: ScoreRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.scores, "score")?;
        guard.insert(record.submission_id.clone(), record);
        Ok(())
    }
}

/// Templates and submissions preloaded into the in-memory stores at startup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedDocument {
    #[serde(default)]
    pub(crate) templates: Vec<QuestionnaireTemplate>,
    #[serde(default)]
    pub(crate) submissions: Vec<Submission>,
}

impl SeedDocument {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Seeded templates keep their version but must still pass validation.
    pub(crate) fn apply(
        self,
        templates: &InMemoryTemplateRepository,
        submissions: &InMemorySubmissionRepository,
    ) -> Result<(usize, usize), AppError> {
        let counts = (self.templates.len(), self.submissions.len());
        for template in self.templates {
            validate_template(&template.tree)
                .map_err(|errors| ServiceError::InvalidTemplate { errors })?;
            templates.insert(template).map_err(ServiceError::from)?;
        }
        for submission in self.submissions {
            submissions.insert(submission).map_err(ServiceError::from)?;
        }
        Ok(counts)
    }
}
