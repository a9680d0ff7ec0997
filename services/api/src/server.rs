use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySubmissionRepository, InMemoryTemplateRepository, SeedDocument};
use crate::routes::with_questionnaire_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use questionnaire_core::config::AppConfig;
use questionnaire_core::error::AppError;
use questionnaire_core::service::QuestionnaireService;
use questionnaire_core::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let templates = Arc::new(InMemoryTemplateRepository::default());
    let submissions = Arc::new(InMemorySubmissionRepository::default());
    if let Some(path) = args.seed.take() {
        let (template_count, submission_count) =
            SeedDocument::load(&path)?.apply(&templates, &submissions)?;
        info!(
            seed = %path.display(),
            templates = template_count,
            submissions = submission_count,
            "seed data loaded"
        );
    }

    let service = Arc::new(QuestionnaireService::new(
        templates,
        submissions,
        config.scoring,
    ));

    let app = with_questionnaire_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_bulk_submissions = config.scoring.max_bulk_submissions,
        "questionnaire engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
