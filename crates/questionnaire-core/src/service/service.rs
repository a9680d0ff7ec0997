use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{RepositoryError, ScoreRecord, SubmissionRepository, TemplateRepository};
use crate::config::ScoringLimits;
use crate::scoring::{
    aggregate_overall, aggregate_scores, Answer, NodeStatistics, ScoringEngine, Submission,
    SubmissionId, SubmissionScore,
};
use crate::tree::{
    validate_template, FormNode, QuestionnaireTemplate, TemplateId, TemplateMetadata,
    ValidationError,
};

/// Template as submitted by the questionnaire builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    #[serde(default)]
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::tree::model::tolerant_nodes")]
    pub tree: Vec<FormNode>,
}

/// Template response enriched with answer-independent metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: QuestionnaireTemplate,
    pub metadata: TemplateMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub submission_id: SubmissionId,
    pub questionnaire_id: TemplateId,
    pub template_version: u32,
    pub student_id: String,
    pub scores: SubmissionScore,
}

/// Per-submission scores plus cohort statistics for one bulk request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScoreReport {
    pub submissions: Vec<ScoreReport>,
    pub statistics: Vec<NodeStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<NodeStatistics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<SubmissionId>,
}

/// Service composing the repositories with validation and scoring.
pub struct QuestionnaireService<T, S> {
    templates: Arc<T>,
    submissions: Arc<S>,
    engine: ScoringEngine,
    limits: ScoringLimits,
}

static TEMPLATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_template_id() -> TemplateId {
    let id = TEMPLATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TemplateId(format!("tpl-{id:06}"))
}

impl<T, S> QuestionnaireService<T, S>
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    pub fn new(templates: Arc<T>, submissions: Arc<S>, limits: ScoringLimits) -> Self {
        Self {
            templates,
            submissions,
            engine: ScoringEngine::default(),
            limits,
        }
    }

    pub fn with_engine(mut self, engine: ScoringEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Validate and store a new template at version 1.
    pub fn create_template(&self, draft: TemplateDraft) -> Result<TemplateView, ServiceError> {
        let id = draft.id.clone().unwrap_or_else(next_template_id);
        check_tree(&id, &draft.tree)?;

        let template = QuestionnaireTemplate {
            id,
            name: draft.name,
            description: draft.description,
            version: 1,
            tree: draft.tree,
        };

        let stored = self.templates.insert(template)?;
        info!(template_id = %stored.id, version = stored.version, "template created");
        Ok(self.view(stored))
    }

    /// Validate and replace a template's tree, bumping its version.
    pub fn update_template(
        &self,
        id: &TemplateId,
        draft: TemplateDraft,
    ) -> Result<TemplateView, ServiceError> {
        let existing = self
            .templates
            .fetch(id)?
            .ok_or_else(|| ServiceError::TemplateNotFound(id.clone()))?;
        check_tree(id, &draft.tree)?;

        let template = QuestionnaireTemplate {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            version: existing.version.saturating_add(1),
            tree: draft.tree,
        };

        self.templates.update(template.clone())?;
        info!(template_id = %template.id, version = template.version, "template updated");
        Ok(self.view(template))
    }

    pub fn template_view(&self, id: &TemplateId) -> Result<TemplateView, ServiceError> {
        let template = self.fetch_template(id)?;
        Ok(self.view(template))
    }

    /// Score a submission against the live version of its template.
    pub fn submission_scores(&self, id: &SubmissionId) -> Result<ScoreReport, ServiceError> {
        let submission = self
            .submissions
            .fetch(id)?
            .ok_or_else(|| ServiceError::SubmissionNotFound(id.clone()))?;
        let template = self.fetch_template(&submission.questionnaire_id)?;
        let scores = self.engine.score(&template.tree, &submission.answers);
        Ok(report(submission, &template, scores))
    }

    /// Score a submission and persist the result.
    pub fn update_scores(&self, id: &SubmissionId) -> Result<ScoreRecord, ServiceError> {
        let report = self.submission_scores(id)?;
        let record = ScoreRecord {
            submission_id: report.submission_id,
            questionnaire_id: report.questionnaire_id,
            template_version: report.template_version,
            scored_at: Utc::now(),
            scores: report.scores,
        };

        self.submissions.store_scores(record.clone())?;
        info!(
            submission_id = %record.submission_id,
            overall_score = record.scores.overall_score,
            "scores persisted"
        );
        Ok(record)
    }

    /// Score many submissions and fold their node scores into cohort
    /// statistics. Unknown submissions, or submissions whose template is
    /// gone, are listed under `missing` instead of failing the batch.
    pub fn bulk_scores(&self, ids: &[SubmissionId]) -> Result<BulkScoreReport, ServiceError> {
        if ids.len() > self.limits.max_bulk_submissions {
            return Err(ServiceError::BatchTooLarge {
                requested: ids.len(),
                limit: self.limits.max_bulk_submissions,
            });
        }

        let mut missing = Vec::new();
        let mut by_template: BTreeMap<TemplateId, Vec<(usize, Submission)>> = BTreeMap::new();
        for (position, id) in ids.iter().enumerate() {
            match self.submissions.fetch(id)? {
                Some(submission) => by_template
                    .entry(submission.questionnaire_id.clone())
                    .or_default()
                    .push((position, submission)),
                None => missing.push(id.clone()),
            }
        }

        let mut slots: Vec<Option<ScoreReport>> = vec![None; ids.len()];
        for (template_id, group) in by_template {
            let Some(template) = self.templates.fetch(&template_id)? else {
                warn!(template_id = %template_id, "template missing for bulk scoring");
                missing.extend(group.into_iter().map(|(_, submission)| submission.id));
                continue;
            };

            let batch: Vec<&[Answer]> = group
                .iter()
                .map(|(_, submission)| submission.answers.as_slice())
                .collect();
            let scores = self.engine.score_batch(&template.tree, &batch);

            for ((position, submission), scores) in group.into_iter().zip(scores) {
                slots[position] = Some(report(submission, &template, scores));
            }
        }

        let submissions: Vec<ScoreReport> = slots.into_iter().flatten().collect();
        let per_submission: Vec<_> = submissions
            .iter()
            .map(|report| report.scores.node_scores.clone())
            .collect();
        let overall_scores: Vec<SubmissionScore> = submissions
            .iter()
            .map(|report| report.scores.clone())
            .collect();

        Ok(BulkScoreReport {
            statistics: aggregate_scores(&per_submission).into_vec(),
            overall: aggregate_overall(&overall_scores),
            submissions,
            missing,
        })
    }

    fn view(&self, template: QuestionnaireTemplate) -> TemplateView {
        let metadata = TemplateMetadata::with_policy(&template.tree, self.engine.policy());
        TemplateView { template, metadata }
    }

    fn fetch_template(&self, id: &TemplateId) -> Result<QuestionnaireTemplate, ServiceError> {
        self.templates
            .fetch(id)?
            .ok_or_else(|| ServiceError::TemplateNotFound(id.clone()))
    }
}

fn check_tree(id: &TemplateId, tree: &[FormNode]) -> Result<(), ServiceError> {
    validate_template(tree).map_err(|errors| {
        warn!(template_id = %id, error_count = errors.len(), "template rejected");
        ServiceError::InvalidTemplate { errors }
    })
}

fn report(
    submission: Submission,
    template: &QuestionnaireTemplate,
    scores: SubmissionScore,
) -> ScoreReport {
    ScoreReport {
        submission_id: submission.id,
        questionnaire_id: template.id.clone(),
        template_version: template.version,
        student_id: submission.student_id,
        scores,
    }
}

/// Error raised by the questionnaire service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("template failed validation with {} error(s)", errors.len())]
    InvalidTemplate { errors: Vec<ValidationError> },
    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),
    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),
    #[error("bulk request names {requested} submissions; the limit is {limit}")]
    BatchTooLarge { requested: usize, limit: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidTemplate { .. } | ServiceError::BatchTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::TemplateNotFound(_)
            | ServiceError::SubmissionNotFound(_)
            | ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
