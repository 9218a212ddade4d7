//! Response model of the prediction service.
//!
//! The service sends two explanation shapes depending on the explainer that produced
//! them. Both are normalized into [`Explanation`] while deserializing so the renderer
//! only ever sees one type.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// `loan_status` value that marks an approval.
pub const APPROVED_STATUS: &str = "Approved";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPrediction")]
pub struct PredictionResult {
    pub loan_status: String,
    pub score: Option<Score>,
    pub risk_category: Option<String>,
    pub explanations: Explanations,
    /// Alternative scenarios, each an ordered list of human-readable steps.
    pub action_plan: Vec<Vec<String>>,
}

impl PredictionResult {
    pub fn is_approved(&self) -> bool {
        self.loan_status == APPROVED_STATUS
    }
}

/// Server-formatted headline score.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    ProbabilityOfDefault(String),
    Confidence(String),
}

impl Score {
    pub fn label(&self) -> &'static str {
        match self {
            Score::ProbabilityOfDefault(_) => "Probability of Default",
            Score::Confidence(_) => "Confidence Score",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Score::ProbabilityOfDefault(v) | Score::Confidence(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Explanations {
    #[serde(default, deserialize_with = "lenient")]
    pub shap_top_factors: Vec<Explanation>,
    #[serde(default, deserialize_with = "lenient")]
    pub lime_rules: RuleExplanations,
}

/// LIME output: a list of rules, or a note when the explainer is unavailable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleExplanations {
    Rules(Vec<Explanation>),
    Note(String),
}

impl Default for RuleExplanations {
    fn default() -> Self {
        RuleExplanations::Rules(Vec::new())
    }
}

/// Which server shape an explanation was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationShape {
    Factor,
    Rule,
    Note,
    /// Neither known shape; whatever could be read is kept.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawExplanation")]
pub struct Explanation {
    pub label: String,
    pub magnitude: Option<f64>,
    pub direction: Option<String>,
    pub shape: ExplanationShape,
}

impl Explanation {
    pub fn increases_risk(&self) -> bool {
        self.direction
            .as_deref()
            .is_some_and(|d| d.contains("Increases"))
    }
}

#[derive(Deserialize)]
struct FactorShape {
    feature: String,
    impact_score: Option<f64>,
    weight: Option<f64>,
    impact_direction: Option<String>,
    impact: Option<String>,
}

#[derive(Deserialize)]
struct RuleShape {
    rule: String,
    weight: Option<f64>,
    impact_score: Option<f64>,
    impact: Option<String>,
    impact_direction: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExplanation {
    Factor(FactorShape),
    Rule(RuleShape),
    Text(String),
    Other(Value),
}

impl From<RawExplanation> for Explanation {
    fn from(raw: RawExplanation) -> Self {
        match raw {
            RawExplanation::Factor(f) => Explanation {
                label: f.feature,
                magnitude: f.impact_score.or(f.weight),
                direction: f.impact_direction.or(f.impact),
                shape: ExplanationShape::Factor,
            },
            RawExplanation::Rule(r) => Explanation {
                label: r.rule,
                magnitude: r.weight.or(r.impact_score),
                direction: r.impact.or(r.impact_direction),
                shape: ExplanationShape::Rule,
            },
            RawExplanation::Text(text) => Explanation {
                label: text,
                magnitude: None,
                direction: None,
                shape: ExplanationShape::Note,
            },
            RawExplanation::Other(value) => {
                let first = |keys: [&str; 2]| {
                    keys.iter()
                        .find_map(|k| value.get(*k).filter(|v| !v.is_null()))
                };
                let label = if value.is_object() {
                    first(["feature", "rule"]).and_then(display_value)
                } else {
                    display_value(&value)
                };
                Explanation {
                    label: label.unwrap_or_default(),
                    magnitude: first(["impact_score", "weight"]).and_then(Value::as_f64),
                    direction: first(["impact_direction", "impact"])
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    shape: ExplanationShape::Unrecognized,
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct RawPrediction {
    loan_status: String,
    #[serde(default)]
    probability_of_default: Option<Value>,
    #[serde(default)]
    confidence_score: Option<Value>,
    #[serde(default)]
    risk_category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    explanations: Explanations,
    #[serde(default, deserialize_with = "lenient")]
    action_plan: Vec<Vec<String>>,
}

impl From<RawPrediction> for PredictionResult {
    fn from(raw: RawPrediction) -> Self {
        let score = raw
            .probability_of_default
            .as_ref()
            .and_then(display_value)
            .map(Score::ProbabilityOfDefault)
            .or_else(|| {
                raw.confidence_score
                    .as_ref()
                    .and_then(display_value)
                    .map(Score::Confidence)
            });

        PredictionResult {
            loan_status: raw.loan_status,
            score,
            risk_category: raw.risk_category,
            explanations: raw.explanations,
            action_plan: raw.action_plan,
        }
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Explanation sections and plans are best effort: a section of the wrong shape reads
/// as empty instead of failing the whole prediction.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}
