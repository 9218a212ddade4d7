use clap::{Parser, ValueEnum};
use loan_form::{DEFAULT_ENDPOINT, SchemaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaArg {
    /// Risk-scoring form (probability of default)
    Risk,
    /// Eligibility form (confidence score)
    Eligibility,
}

impl From<SchemaArg> for SchemaId {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Risk => SchemaId::RiskScoring,
            SchemaArg::Eligibility => SchemaId::Eligibility,
        }
    }
}

/// Terminal client for the loan prediction service.
#[derive(Debug, Parser)]
#[command(name = "loan-predictor", version)]
pub struct Args {
    /// Prediction endpoint
    #[arg(long, env = "LOAN_PREDICTOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Applicant form to present
    #[arg(long, value_enum, env = "LOAN_PREDICTOR_SCHEMA", default_value_t = SchemaArg::Risk)]
    pub schema: SchemaArg,

    /// Pre-fill a field before starting, e.g. `--set loan_amnt=12000`
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Submit once, print the outcome and exit
    #[arg(long)]
    pub once: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{}`", raw))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{}`", raw));
    }
    Ok((field.to_string(), value.trim().to_string()))
}
