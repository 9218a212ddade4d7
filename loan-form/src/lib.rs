//! Loan application form client.
//!
//! Declarative form schemas, editable form state, request payload coercion, the
//! submission state machine, an HTTP client for the prediction service, and text
//! display trees for the form and the returned assessment.

pub mod client;
pub mod error;
pub mod form;
pub mod input;
pub mod payload;
pub mod prediction;
pub mod render;
pub mod schema;
pub mod submission;

// Re-export commonly used types
pub use client::{DEFAULT_ENDPOINT, HttpPredictionClient, PredictionClient};
pub use error::{GENERIC_FAILURE, Result, SubmitError};
pub use form::{FieldValue, FormController, FormState};
pub use input::{Control, InputGroup, InputType};
pub use payload::{PredictionRequest, build_payload};
pub use prediction::{
    APPROVED_STATUS, Explanation, ExplanationShape, Explanations, PredictionResult,
    RuleExplanations, Score,
};
pub use render::{FormView, ResultView, Tone};
pub use schema::{DerivedRatio, FieldKind, FieldSpec, FormSchema, SchemaId, SelectOption};
pub use submission::{AssessmentSession, SubmissionState, View};
