use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    client::PredictionClient,
    error::{Result, SubmitError},
    form::{FieldValue, FormController},
    payload::{PredictionRequest, build_payload},
    prediction::PredictionResult,
    schema::FormSchema,
};

/// Lifecycle of one assessment. Exactly one of these holds at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success(PredictionResult),
    Failure(String),
}

impl SubmissionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            SubmissionState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SubmissionState::Failure(message) => Some(message),
            _ => None,
        }
    }
}

/// Which screen the state maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Result,
}

/// Form plus submission state for one applicant at a time.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    form: FormController,
    state: SubmissionState,
}

impl AssessmentSession {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            form: FormController::new(schema),
            state: SubmissionState::Idle,
        }
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn schema(&self) -> &FormSchema {
        self.form.schema()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn view(&self) -> View {
        match self.state {
            SubmissionState::Success(_) => View::Result,
            _ => View::Form,
        }
    }

    pub fn update_field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.form.update_field(key, value);
    }

    /// The submit control is disabled while a request is outstanding.
    pub fn submit_enabled(&self) -> bool {
        !self.state.is_busy()
    }

    /// Enter `Submitting` and build the request body.
    ///
    /// Refused with [`SubmitError::Busy`] while another request is outstanding; the
    /// state is left untouched in that case. A coercion failure moves straight to
    /// `Failure` and no request should be sent.
    pub fn begin_submit(&mut self) -> Result<PredictionRequest> {
        if self.state.is_busy() {
            warn!("Submission refused: request already in flight");
            return Err(SubmitError::Busy);
        }

        self.state = SubmissionState::Submitting;

        match build_payload(self.form.schema(), self.form.state()) {
            Ok(payload) => Ok(payload),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Settle the outstanding request. Ignored unless a request is in flight.
    pub fn finish_submit(&mut self, outcome: Result<PredictionResult>) {
        if !self.state.is_busy() {
            warn!("Ignoring outcome: no submission in flight");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(loan_status = %result.loan_status, "Submission succeeded");
                self.state = SubmissionState::Success(result);
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Run one full submission against `client`.
    pub async fn submit(&mut self, client: &dyn PredictionClient) -> &SubmissionState {
        let span = info_span!(
            "submission",
            submission_id = %Uuid::new_v4(),
            schema = self.form.schema().id.as_str()
        );

        async {
            let payload = match self.begin_submit() {
                Ok(payload) => payload,
                Err(_) => return,
            };
            let outcome = client.predict(&payload).await;
            self.finish_submit(outcome);
        }
        .instrument(span)
        .await;

        &self.state
    }

    /// "Assess another": back to an editable form with default values.
    pub fn reset(&mut self) {
        if self.state.is_busy() {
            warn!("Reset refused: request already in flight");
            return;
        }
        self.state = SubmissionState::Idle;
        self.form.reset();
    }

    fn fail(&mut self, e: &SubmitError) {
        error!(error = %e, "Submission failed");
        self.state = SubmissionState::Failure(e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubClient {
        outcome: Result<PredictionResult>,
        requests: Mutex<Vec<PredictionRequest>>,
    }

    impl StubClient {
        fn new(outcome: Result<PredictionResult>) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PredictionClient for StubClient {
        async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    fn rejected() -> PredictionResult {
        serde_json::from_value(json!({
            "loan_status": "Rejected",
            "probability_of_default": "70.00%",
            "action_plan": [["Increase income by $5000"]]
        }))
        .unwrap()
    }

    #[test]
    fn test_submit_control_disabled_while_in_flight() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        assert!(session.submit_enabled());

        session.begin_submit().unwrap();
        assert!(!session.submit_enabled());
        assert_eq!(session.begin_submit(), Err(SubmitError::Busy));
        assert_eq!(session.state(), &SubmissionState::Submitting);

        session.finish_submit(Ok(rejected()));
        assert!(session.submit_enabled());
        assert_eq!(session.view(), View::Result);

        session.begin_submit().unwrap();
        session.finish_submit(Err(SubmitError::transport("connection refused")));
        assert!(session.submit_enabled());
        assert_eq!(session.state().error(), Some("connection refused"));
    }

    #[test]
    fn test_new_submission_clears_prior_error() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.begin_submit().unwrap();
        session.finish_submit(Err(SubmitError::rejected(503, br#"{"detail":"Model not loaded"}"#)));
        assert_eq!(session.state().error(), Some("Model not loaded"));

        session.begin_submit().unwrap();
        assert!(session.state().error().is_none());
        assert!(session.state().result().is_none());
    }

    #[test]
    fn test_failure_preserves_form() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.update_field("loan_amnt", "25000");
        let before = session.form().state().clone();

        session.begin_submit().unwrap();
        session.finish_submit(Err(SubmitError::transport("")));

        assert_eq!(session.state().error(), Some(crate::GENERIC_FAILURE));
        assert_eq!(session.view(), View::Form);
        assert_eq!(session.form().state(), &before);
    }

    #[test]
    fn test_coercion_failure_skips_request() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.update_field("person_age", "twenty");
        assert!(session.begin_submit().is_err());
        assert_eq!(session.state().error(), Some("Age must be a number"));
        assert!(session.submit_enabled());
    }

    #[test]
    fn test_finish_without_submission_is_ignored() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.finish_submit(Ok(rejected()));
        assert_eq!(session.state(), &SubmissionState::Idle);
    }

    #[test]
    fn test_reset_discards_result_and_edits() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.update_field("credit_score", "720");
        session.begin_submit().unwrap();
        session.finish_submit(Ok(rejected()));
        assert!(session.state().result().is_some());

        session.reset();
        assert_eq!(session.view(), View::Form);
        assert_eq!(session.state(), &SubmissionState::Idle);
        assert!(session.state().result().is_none());
        assert_eq!(session.form().state(), &FormSchema::risk_scoring().defaults());

        session.reset();
        assert_eq!(session.state(), &SubmissionState::Idle);
    }

    #[test]
    fn test_reset_refused_while_in_flight() {
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.begin_submit().unwrap();
        session.reset();
        assert!(session.state().is_busy());
    }

    #[tokio::test]
    async fn test_submit_sends_one_request() {
        let client = StubClient::new(Ok(rejected()));
        let mut session = AssessmentSession::new(FormSchema::risk_scoring());
        session.update_field("person_income", "50000");

        let state = session.submit(&client).await;
        assert_eq!(state.result().map(|r| r.loan_status.as_str()), Some("Rejected"));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].get("loan_percent_income"), Some(&json!(0.2)));
    }

    #[tokio::test]
    async fn test_submit_with_bad_input_never_calls_client() {
        let client = StubClient::new(Ok(rejected()));
        let mut session = AssessmentSession::new(FormSchema::eligibility());
        session.update_field("LoanAmount", "lots");

        let state = session.submit(&client).await;
        assert_eq!(state.error(), Some("Loan Amount (thousands) must be a number"));
        assert!(client.requests.lock().unwrap().is_empty());
    }
}
