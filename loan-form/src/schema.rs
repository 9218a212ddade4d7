//! Declarative form schemas.
//!
//! Both applicant forms are described as data: titled sections of fields, each with a
//! coercion kind, optional select options and a default. The controller, the payload
//! builder and the input renderer are all driven from a [`FormSchema`], so adding a
//! field never touches more than the schema constructor.

use crate::form::{FieldValue, FormState};

/// How a field's raw input is coerced when the payload is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub label: &'static str,
    pub value: &'static str,
}

const fn opt(label: &'static str, value: &'static str) -> SelectOption {
    SelectOption { label, value }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub options: &'static [SelectOption],
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn integer(key: &'static str, label: &'static str, default: i64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Integer,
            options: &[],
            default: FieldValue::from(default),
        }
    }

    pub fn float(key: &'static str, label: &'static str, default: f64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Float,
            options: &[],
            default: FieldValue::from(default),
        }
    }

    pub fn select(
        key: &'static str,
        label: &'static str,
        options: &'static [SelectOption],
        default: &'static str,
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            options,
            default: FieldValue::from(default),
        }
    }

    /// Override the coercion kind, e.g. for a select whose values are numeric.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_select(&self) -> bool {
        !self.options.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// A field computed at submission time as `numerator / denominator`.
///
/// Yields 0 unless the denominator is strictly positive. Never stored in the form.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRatio {
    pub key: &'static str,
    pub numerator: &'static str,
    pub denominator: &'static str,
    pub decimals: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaId {
    RiskScoring,
    Eligibility,
}

impl SchemaId {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaId::RiskScoring => "risk_scoring",
            SchemaId::Eligibility => "eligibility",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    pub id: SchemaId,
    pub title: &'static str,
    pub sections: Vec<Section>,
    pub derived: Vec<DerivedRatio>,
}

const GENDERS_LOWER: &[SelectOption] = &[opt("Male", "male"), opt("Female", "female")];
const EDUCATION_LEVELS: &[SelectOption] = &[
    opt("High School", "High School"),
    opt("Associate", "Associate"),
    opt("Bachelor", "Bachelor"),
    opt("Master", "Master"),
    opt("Doctorate", "Doctorate"),
];
const HOME_OWNERSHIP: &[SelectOption] = &[
    opt("Rent", "RENT"),
    opt("Own", "OWN"),
    opt("Mortgage", "MORTGAGE"),
    opt("Other", "OTHER"),
];
const LOAN_INTENTS: &[SelectOption] = &[
    opt("Personal", "PERSONAL"),
    opt("Education", "EDUCATION"),
    opt("Medical", "MEDICAL"),
    opt("Venture", "VENTURE"),
    opt("Home Improvement", "HOMEIMPROVEMENT"),
    opt("Debt Consolidation", "DEBTCONSOLIDATION"),
];
const NO_YES: &[SelectOption] = &[opt("No", "No"), opt("Yes", "Yes")];

const GENDERS: &[SelectOption] = &[opt("Male", "Male"), opt("Female", "Female")];
const YES_NO: &[SelectOption] = &[opt("Yes", "Yes"), opt("No", "No")];
const DEPENDENTS: &[SelectOption] = &[
    opt("0", "0"),
    opt("1", "1"),
    opt("2", "2"),
    opt("3+", "3+"),
];
const GRADUATE: &[SelectOption] = &[
    opt("Graduate", "Graduate"),
    opt("Not Graduate", "Not Graduate"),
];
const CREDIT_HISTORY: &[SelectOption] = &[opt("Good (1.0)", "1.0"), opt("Bad (0.0)", "0.0")];
const PROPERTY_AREAS: &[SelectOption] = &[
    opt("Urban", "Urban"),
    opt("Semiurban", "Semiurban"),
    opt("Rural", "Rural"),
];

impl FormSchema {
    /// Risk-scoring applicant form (probability of default).
    pub fn risk_scoring() -> Self {
        Self {
            id: SchemaId::RiskScoring,
            title: "Applicant Details",
            sections: vec![
                Section {
                    title: "Personal",
                    fields: vec![
                        FieldSpec::integer("person_age", "Age", 25),
                        FieldSpec::select("person_gender", "Gender", GENDERS_LOWER, "male"),
                        FieldSpec::select(
                            "person_education",
                            "Education",
                            EDUCATION_LEVELS,
                            "Bachelor",
                        ),
                        FieldSpec::select(
                            "person_home_ownership",
                            "Home Ownership",
                            HOME_OWNERSHIP,
                            "RENT",
                        ),
                    ],
                },
                Section {
                    title: "Financial",
                    fields: vec![
                        FieldSpec::float("person_income", "Annual Income ($)", 55000.0),
                        FieldSpec::integer("person_emp_exp", "Employment Exp (Years)", 2),
                        FieldSpec::float("loan_amnt", "Loan Amount ($)", 10000.0),
                        FieldSpec::select("loan_intent", "Intent", LOAN_INTENTS, "PERSONAL"),
                    ],
                },
                Section {
                    title: "Credit Profile",
                    fields: vec![
                        FieldSpec::float("loan_int_rate", "Interest Rate (%)", 11.5),
                        FieldSpec::integer("credit_score", "Credit Score", 650),
                        FieldSpec::integer(
                            "cb_person_cred_hist_length",
                            "Credit History (Years)",
                            3,
                        ),
                        FieldSpec::select(
                            "previous_loan_defaults_on_file",
                            "Prior Defaults",
                            NO_YES,
                            "No",
                        ),
                    ],
                },
            ],
            derived: vec![DerivedRatio {
                key: "loan_percent_income",
                numerator: "loan_amnt",
                denominator: "person_income",
                decimals: 2,
            }],
        }
    }

    /// Eligibility applicant form (confidence score).
    pub fn eligibility() -> Self {
        Self {
            id: SchemaId::Eligibility,
            title: "Applicant Details",
            sections: vec![
                Section {
                    title: "Personal",
                    fields: vec![
                        FieldSpec::select("Gender", "Gender", GENDERS, "Male"),
                        FieldSpec::select("Married", "Married", YES_NO, "Yes"),
                        FieldSpec::select("Dependents", "Dependents", DEPENDENTS, "0"),
                        FieldSpec::select("Education", "Education", GRADUATE, "Graduate"),
                        FieldSpec::select("Self_Employed", "Self Employed", YES_NO, "No"),
                    ],
                },
                Section {
                    title: "Financial",
                    fields: vec![
                        FieldSpec::float("ApplicantIncome", "Applicant Income ($)", 5000.0),
                        FieldSpec::float("CoapplicantIncome", "Co-applicant Income ($)", 0.0),
                        FieldSpec::float("LoanAmount", "Loan Amount (thousands)", 150.0),
                        FieldSpec::float("Loan_Amount_Term", "Loan Term (Months)", 360.0),
                    ],
                },
                Section {
                    title: "Credit Profile",
                    fields: vec![
                        FieldSpec::select(
                            "Credit_History",
                            "Credit History",
                            CREDIT_HISTORY,
                            "1.0",
                        )
                        .with_kind(FieldKind::Float),
                        FieldSpec::select(
                            "Property_Area",
                            "Property Area",
                            PROPERTY_AREAS,
                            "Urban",
                        ),
                    ],
                },
            ],
            derived: Vec::new(),
        }
    }

    pub fn for_id(id: SchemaId) -> Self {
        match id {
            SchemaId::RiskScoring => Self::risk_scoring(),
            SchemaId::Eligibility => Self::eligibility(),
        }
    }

    /// All fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.key == key)
    }

    /// Resolve a user reference to a field: a 1-based position in display order,
    /// an exact key, or a case-insensitive key.
    pub fn resolve_field(&self, reference: &str) -> Option<&FieldSpec> {
        let reference = reference.trim();
        if let Ok(position) = reference.parse::<usize>() {
            return position.checked_sub(1).and_then(|i| self.fields().nth(i));
        }
        self.field(reference).or_else(|| {
            self.fields()
                .find(|f| f.key.eq_ignore_ascii_case(reference))
        })
    }

    pub fn defaults(&self) -> FormState {
        self.fields()
            .map(|f| (f.key.to_string(), f.default.clone()))
            .collect()
    }
}
