mod config;
mod terminal;

use anyhow::bail;
use clap::Parser;
use loan_form::{
    AssessmentSession, FormSchema, HttpPredictionClient, ResultView, SchemaId, SubmissionState,
};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::terminal::{Terminal, apply_assignment};

/// Initialize tracing on stderr so logs never interleave with the form on stdout.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "loan_predictor=warn,loan_form=warn".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let schema_id = SchemaId::from(args.schema);
    let mut session = AssessmentSession::new(FormSchema::for_id(schema_id));

    for (field, value) in &args.assignments {
        if apply_assignment(&mut session, field, value).is_none() {
            bail!("unknown field `{}` for the {} form", field, schema_id.as_str());
        }
    }

    let client = HttpPredictionClient::new(args.endpoint);
    info!(
        endpoint = %client.endpoint(),
        schema = schema_id.as_str(),
        once = args.once,
        "Loan predictor starting"
    );

    if args.once {
        return match session.submit(&client).await {
            SubmissionState::Success(result) => {
                println!("{}", ResultView::from_result(result));
                Ok(())
            }
            SubmissionState::Failure(message) => bail!("{}", message),
            other => bail!("submission did not settle: {:?}", other),
        };
    }

    let mut terminal = Terminal::new(session, &client, std::io::stdout());
    terminal.run(BufReader::new(tokio::io::stdin())).await
}
