use crate::commands::{run_score, run_validate, ScoreArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use questionnaire_core::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Questionnaire Engine",
    about = "Validate questionnaire templates, score submissions, or serve the scoring API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Check a template document for structural and conditional errors
    Validate(ValidateArgs),
    /// Score a submission document against a template document
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file with `templates` and `submissions` to preload into memory
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate(args) => run_validate(args),
        Command::Score(args) => run_score(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "questionnaire",
            "score",
            "--template",
            "template.json",
            "--submission",
            "submission.json",
            "--json",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.template, PathBuf::from("template.json"));
                assert_eq!(args.submission, PathBuf::from("submission.json"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["questionnaire"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn validate_requires_template() {
        assert!(Cli::try_parse_from(["questionnaire", "validate"]).is_err());
    }
}
