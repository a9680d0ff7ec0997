use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::repository::{SubmissionRepository, TemplateRepository};
use super::service::{QuestionnaireService, ServiceError, TemplateDraft};
use crate::scoring::SubmissionId;
use crate::tree::TemplateId;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScoresRequest {
    pub submission_ids: Vec<SubmissionId>,
}

/// Router exposing template management and scoring endpoints.
pub fn questionnaire_router<T, S>(service: Arc<QuestionnaireService<T, S>>) -> Router
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    Router::new()
        .route("/api/v1/templates", post(create_template_handler::<T, S>))
        .route(
            "/api/v1/templates/:template_id",
            get(template_handler::<T, S>).put(update_template_handler::<T, S>),
        )
        .route(
            "/api/v1/submissions/:submission_id/scores",
            get(scores_handler::<T, S>),
        )
        .route(
            "/api/v1/submissions/:submission_id/update-scores",
            put(update_scores_handler::<T, S>),
        )
        .route(
            "/api/v1/submissions/bulk-scores",
            post(bulk_scores_handler::<T, S>),
        )
        .with_state(service)
}

pub(crate) async fn create_template_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    axum::Json(draft): axum::Json<TemplateDraft>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    match service.create_template(draft) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn template_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    Path(template_id): Path<String>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    match service.template_view(&TemplateId(template_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_template_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    Path(template_id): Path<String>,
    axum::Json(draft): axum::Json<TemplateDraft>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    match service.update_template(&TemplateId(template_id), draft) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn scores_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    match service.submission_scores(&SubmissionId(submission_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_scores_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    match service.update_scores(&SubmissionId(submission_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Bulk scoring fans out over rayon, so it runs off the async workers.
pub(crate) async fn bulk_scores_handler<T, S>(
    State(service): State<Arc<QuestionnaireService<T, S>>>,
    axum::Json(request): axum::Json<BulkScoresRequest>,
) -> Response
where
    T: TemplateRepository + 'static,
    S: SubmissionRepository + 'static,
{
    let outcome =
        tokio::task::spawn_blocking(move || service.bulk_scores(&request.submission_ids)).await;

    match outcome {
        Ok(Ok(report)) => (StatusCode::OK, axum::Json(report)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "bulk scoring task failed");
            let payload = json!({
                "error": "bulk scoring task failed",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn error_response(err: ServiceError) -> Response {
    let status = err.status_code();
    let payload = match &err {
        ServiceError::InvalidTemplate { errors } => json!({
            "error": err.to_string(),
            "errors": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
        _ => json!({
            "error": err.to_string(),
        }),
    };
    if status.is_server_error() {
        error!(error = %err, "questionnaire request failed");
    }
    (status, axum::Json(payload)).into_response()
}
