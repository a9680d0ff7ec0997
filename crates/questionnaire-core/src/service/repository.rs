use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{Submission, SubmissionId, SubmissionScore};
use crate::tree::{QuestionnaireTemplate, TemplateId};

/// Storage abstraction for questionnaire templates.
pub trait TemplateRepository: Send + Sync {
    fn insert(
        &self,
        template: QuestionnaireTemplate,
    ) -> Result<QuestionnaireTemplate, RepositoryError>;
    fn update(&self, template: QuestionnaireTemplate) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TemplateId) -> Result<Option<QuestionnaireTemplate>, RepositoryError>;
}

/// Storage abstraction for submissions and their cached scores.
pub trait SubmissionRepository: Send + Sync {
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    fn store_scores(&self, record: ScoreRecord) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Scores computed for a submission, stamped with the template version
/// they were computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub submission_id: SubmissionId,
    pub questionnaire_id: TemplateId,
    pub template_version: u32,
    pub scored_at: DateTime<Utc>,
    pub scores: SubmissionScore,
}
