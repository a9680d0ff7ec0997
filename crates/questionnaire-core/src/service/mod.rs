//! Template management and scoring workflows over pluggable repositories.
//!
//! Storage is abstracted behind [`TemplateRepository`] and
//! [`SubmissionRepository`]; the HTTP surface is assembled by
//! [`questionnaire_router`].

pub mod repository;
pub mod router;
#[allow(clippy::module_inception)]
pub mod service;

#[cfg(test)]
mod tests;

pub use repository::{RepositoryError, ScoreRecord, SubmissionRepository, TemplateRepository};
pub use router::{questionnaire_router, BulkScoresRequest};
pub use service::{
    BulkScoreReport, QuestionnaireService, ScoreReport, ServiceError, TemplateDraft, TemplateView,
};
