//! Display trees for the two screens and their plain-text rendering.

use std::fmt;

use crate::{
    input::InputGroup,
    prediction::{Explanation, PredictionResult, RuleExplanations},
    submission::AssessmentSession,
};

pub const SUBMIT_LABEL: &str = "Predict Status";
pub const BUSY_LABEL: &str = "Analyzing...";
pub const RESET_LABEL: &str = "Assess Another Applicant";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Check,
    Cross,
}

impl StatusIcon {
    fn glyph(self) -> &'static str {
        match self {
            StatusIcon::Check => "[✓]",
            StatusIcon::Cross => "[✗]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationRow {
    pub label: String,
    pub value: Option<String>,
    pub tone: Tone,
}

impl From<&Explanation> for ExplanationRow {
    fn from(item: &Explanation) -> Self {
        Self {
            label: item.label.clone(),
            value: item.magnitude.map(|m| m.to_string()),
            tone: if item.increases_risk() {
                Tone::Danger
            } else {
                Tone::Success
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RulesView {
    Rows(Vec<ExplanationRow>),
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOption {
    pub title: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlanView {
    pub options: Vec<PlanOption>,
}

/// Everything the result screen shows, derived purely from a [`PredictionResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub icon: StatusIcon,
    pub tone: Tone,
    pub status: String,
    pub score_line: Option<String>,
    pub risk_badge: Option<Badge>,
    pub drivers: Vec<ExplanationRow>,
    pub rules: RulesView,
    pub action_plan: Option<ActionPlanView>,
}

impl ResultView {
    pub fn from_result(result: &PredictionResult) -> Self {
        let approved = result.is_approved();

        let risk_badge = result.risk_category.as_ref().map(|category| Badge {
            text: category.clone(),
            tone: if category == "High Risk" {
                Tone::Danger
            } else {
                Tone::Success
            },
        });

        let rules = match &result.explanations.lime_rules {
            RuleExplanations::Rules(items) => {
                RulesView::Rows(items.iter().map(ExplanationRow::from).collect())
            }
            RuleExplanations::Note(note) => RulesView::Note(note.clone()),
        };

        // Plans are only offered on a rejection.
        let action_plan = (!approved && !result.action_plan.is_empty()).then(|| ActionPlanView {
            options: result
                .action_plan
                .iter()
                .enumerate()
                .map(|(i, steps)| PlanOption {
                    title: format!("Option {}:", i + 1),
                    steps: steps.clone(),
                })
                .collect(),
        });

        Self {
            icon: if approved {
                StatusIcon::Check
            } else {
                StatusIcon::Cross
            },
            tone: if approved { Tone::Success } else { Tone::Danger },
            status: result.loan_status.clone(),
            score_line: result
                .score
                .as_ref()
                .map(|s| format!("{}: {}", s.label(), s.value())),
            risk_badge,
            drivers: result
                .explanations
                .shap_top_factors
                .iter()
                .map(ExplanationRow::from)
                .collect(),
            rules,
            action_plan,
        }
    }
}

fn tone_marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "▼",
        Tone::Danger => "▲",
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &ExplanationRow) -> fmt::Result {
    match &row.value {
        Some(value) => writeln!(
            f,
            "    {:<40} {} {}",
            row.label,
            tone_marker(row.tone),
            value
        ),
        None => writeln!(f, "    {}", row.label),
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} {}", self.icon.glyph(), self.status)?;
        if let Some(score) = &self.score_line {
            writeln!(f, "  {}", score)?;
        }
        if let Some(badge) = &self.risk_badge {
            writeln!(f, "  ({})", badge.text)?;
        }

        writeln!(f)?;
        writeln!(f, "  AI Analysis")?;
        writeln!(f, "  Key Drivers (SHAP)")?;
        for row in &self.drivers {
            write_row(f, row)?;
        }
        writeln!(f, "  Specific Rules (LIME)")?;
        match &self.rules {
            RulesView::Rows(rows) => {
                for row in rows {
                    write_row(f, row)?;
                }
            }
            RulesView::Note(note) => writeln!(f, "    _{}_", note)?,
        }

        if let Some(plan) = &self.action_plan {
            writeln!(f)?;
            writeln!(f, "  Path to Approval")?;
            writeln!(
                f,
                "  Our AI found {} alternative scenarios where your loan would be approved:",
                plan.options.len()
            )?;
            for option in &plan.options {
                writeln!(f, "    {}", option.title.to_uppercase())?;
                for step in &option.steps {
                    writeln!(f, "      - {}", step)?;
                }
            }
        }

        writeln!(f)?;
        write!(f, "  [{}]  (type 'reset')", RESET_LABEL)
    }
}

/// The editable form screen: error banner, numbered inputs and the submit control.
pub struct FormView<'a> {
    session: &'a AssessmentSession,
}

impl<'a> FormView<'a> {
    pub fn new(session: &'a AssessmentSession) -> Self {
        Self { session }
    }

    pub fn banner(&self) -> Option<&'a str> {
        self.session.state().error()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.session.submit_enabled() {
            SUBMIT_LABEL
        } else {
            BUSY_LABEL
        }
    }
}

impl fmt::Display for FormView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = self.banner() {
            writeln!(f, "  !! {}", message)?;
            writeln!(f)?;
        }

        let schema = self.session.schema();
        let form = self.session.form();
        writeln!(f, "  {}", schema.title)?;

        let mut position = 0;
        for section in &schema.sections {
            writeln!(f)?;
            writeln!(f, "  {}", section.title.to_uppercase())?;
            for field in &section.fields {
                position += 1;
                writeln!(f, "{}", InputGroup::new(position, field, form.get(field.key)))?;
            }
        }

        writeln!(f)?;
        write!(f, "  [{}]", self.submit_label())?;
        if self.session.submit_enabled() {
            write!(f, "  (type 'submit')")?;
        }
        Ok(())
    }
}
