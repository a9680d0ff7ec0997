use clap::Args;
use questionnaire_core::error::AppError;
use questionnaire_core::scoring::{ScoringEngine, Submission, SubmissionScore};
use questionnaire_core::service::ServiceError;
use questionnaire_core::tree::{validate_template, QuestionnaireTemplate, TemplateMetadata};
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Template document (JSON)
    #[arg(long)]
    pub(crate) template: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Template document (JSON)
    #[arg(long)]
    pub(crate) template: PathBuf,
    /// Submission document (JSON)
    #[arg(long)]
    pub(crate) submission: PathBuf,
    /// Print the full score breakdown as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let template: QuestionnaireTemplate = read_document(&args.template)?;

    match validate_template(&template.tree) {
        Ok(()) => {
            let metadata = TemplateMetadata::from_tree(&template.tree);
            println!("{}", render_valid(&template, &metadata));
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("- {error}");
            }
            Err(ServiceError::InvalidTemplate { errors }.into())
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let template: QuestionnaireTemplate = read_document(&args.template)?;
    let submission: Submission = read_document(&args.submission)?;

    if let Err(errors) = validate_template(&template.tree) {
        return Err(ServiceError::InvalidTemplate { errors }.into());
    }
    if submission.questionnaire_id != template.id {
        info!(
            submission_template = %submission.questionnaire_id,
            template = %template.id,
            "scoring submission against a different template id"
        );
    }

    let score = ScoringEngine::default().score(&template.tree, &submission.answers);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        println!("{}", render_score(&template, &submission, &score));
    }
    Ok(())
}

pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn render_valid(template: &QuestionnaireTemplate, metadata: &TemplateMetadata) -> String {
    format!(
        "Template {} v{} is valid: {} nodes, {} questions ({} graphable), max possible score {:.1}",
        template.id,
        template.version,
        metadata.total_nodes,
        metadata.total_questions,
        metadata.graphable_questions,
        metadata.max_possible_score,
    )
}

pub(crate) fn render_score(
    template: &QuestionnaireTemplate,
    submission: &Submission,
    score: &SubmissionScore,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Submission {} (student {}) against {} v{}",
        submission.id, submission.student_id, template.id, template.version
    );
    let _ = writeln!(
        out,
        "Overall: {:.1} ({}/{} answered, {} skipped)",
        score.overall_score,
        score.answered_questions,
        score.total_questions,
        score.skipped_answers
    );
    for node in &score.node_scores {
        let indent = "  ".repeat(node.node_path.depth());
        let _ = writeln!(
            out,
            "{indent}{} [{}]: {:.1} ({}/{} answered)",
            node.title, node.node_id, node.score, node.answered_questions, node.total_questions
        );
    }
    out.trim_end().to_string()
}
