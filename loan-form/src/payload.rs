use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::{
    error::{Result, SubmitError},
    form::{FieldValue, FormState},
    schema::{DerivedRatio, FieldKind, FieldSpec, FormSchema},
};

/// JSON request body sent to the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionRequest(pub Map<String, Value>);

impl PredictionRequest {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Copy the form into a request body, coercing numeric fields and appending
/// derived fields.
pub fn build_payload(schema: &FormSchema, state: &FormState) -> Result<PredictionRequest> {
    let mut body: Map<String, Value> = state
        .iter()
        .map(|(key, value)| (key.to_string(), raw_value(value)))
        .collect();

    for field in schema.fields().filter(|f| f.kind.is_numeric()) {
        let value = state.get(field.key).unwrap_or(&field.default);
        body.insert(field.key.to_string(), coerce(field, value)?);
    }

    for derived in &schema.derived {
        body.insert(derived.key.to_string(), derive_ratio(derived, state));
    }

    Ok(PredictionRequest(body))
}

fn raw_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

fn coerce(field: &FieldSpec, value: &FieldValue) -> Result<Value> {
    let invalid = || SubmitError::InvalidNumber {
        key: field.key.to_string(),
        label: field.label.to_string(),
        value: value.to_string(),
    };

    match field.kind {
        FieldKind::Integer => {
            // Fractional input is truncated toward zero; out-of-range input is invalid.
            let n = value.as_number().ok_or_else(invalid)?.trunc();
            if n < i64::MIN as f64 || n >= i64::MAX as f64 {
                return Err(invalid());
            }
            Ok(Value::from(n as i64))
        }
        FieldKind::Float => {
            let n = value.as_number().ok_or_else(invalid)?;
            Number::from_f64(n).map(Value::Number).ok_or_else(invalid)
        }
        FieldKind::Text => Ok(raw_value(value)),
    }
}

fn derive_ratio(derived: &DerivedRatio, state: &FormState) -> Value {
    let numerator = state.get(derived.numerator).and_then(FieldValue::as_number);
    let denominator = state.get(derived.denominator).and_then(FieldValue::as_number);

    let ratio = match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => n / d,
        _ => 0.0,
    };

    let scale = 10f64.powi(derived.decimals);
    let rounded = (ratio * scale).round() / scale;
    Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormController;

    fn payload_for(form: &FormController) -> PredictionRequest {
        build_payload(form.schema(), form.state()).unwrap()
    }

    #[test]
    fn test_defaults_coerce_to_expected_types() {
        let form = FormController::new(FormSchema::risk_scoring());
        let body = payload_for(&form);

        assert_eq!(body.get("person_age"), Some(&Value::from(25)));
        assert!(body.get("person_age").unwrap().is_i64());
        assert!(body.get("person_income").unwrap().is_f64());
        assert_eq!(body.get("loan_int_rate"), Some(&Value::from(11.5)));
        assert_eq!(body.get("person_gender"), Some(&Value::from("male")));
        assert_eq!(body.get("credit_score"), Some(&Value::from(650)));
        assert_eq!(body.0.len(), 13);
    }

    #[test]
    fn test_text_edits_are_coerced() {
        let mut form = FormController::new(FormSchema::risk_scoring());
        form.update_field("person_age", "41");
        form.update_field("person_emp_exp", "7.9");
        form.update_field("loan_int_rate", " 9.25 ");
        let body = payload_for(&form);

        assert_eq!(body.get("person_age"), Some(&Value::from(41)));
        assert_eq!(body.get("person_emp_exp"), Some(&Value::from(7)));
        assert_eq!(body.get("loan_int_rate"), Some(&Value::from(9.25)));
    }

    #[test]
    fn test_loan_percent_income_zero_income() {
        let mut form = FormController::new(FormSchema::risk_scoring());
        form.update_field("person_income", "0");
        for amount in ["0", "10000", "999999"] {
            form.update_field("loan_amnt", amount);
            let body = payload_for(&form);
            assert_eq!(body.get("loan_percent_income"), Some(&Value::from(0.0)));
        }
    }

    #[test]
    fn test_loan_percent_income_ratio() {
        let mut form = FormController::new(FormSchema::risk_scoring());
        form.update_field("person_income", "50000");
        form.update_field("loan_amnt", "10000");
        let body = payload_for(&form);
        assert_eq!(body.get("loan_percent_income"), Some(&Value::from(0.2)));

        form.update_field("loan_amnt", "12345");
        let body = payload_for(&form);
        assert_eq!(body.get("loan_percent_income"), Some(&Value::from(0.25)));
    }

    #[test]
    fn test_derived_field_is_not_stored() {
        let form = FormController::new(FormSchema::risk_scoring());
        let _ = payload_for(&form);
        assert!(form.get("loan_percent_income").is_none());
    }

    #[test]
    fn test_invalid_number_is_reported_with_label() {
        let mut form = FormController::new(FormSchema::risk_scoring());
        form.update_field("credit_score", "excellent");
        let err = build_payload(form.schema(), form.state()).unwrap_err();
        assert_eq!(err.to_string(), "Credit Score must be a number");
    }

    #[test]
    fn test_out_of_range_integer_is_invalid() {
        let mut form = FormController::new(FormSchema::risk_scoring());
        form.update_field("credit_score", "1e30");
        let err = build_payload(form.schema(), form.state()).unwrap_err();
        assert_eq!(err.to_string(), "Credit Score must be a number");

        form.update_field("credit_score", "-1e19");
        assert!(build_payload(form.schema(), form.state()).is_err());

        form.update_field("credit_score", "720.9");
        let body = payload_for(&form);
        assert_eq!(body.get("credit_score"), Some(&Value::from(720)));
    }

    #[test]
    fn test_eligibility_payload() {
        let mut form = FormController::new(FormSchema::eligibility());
        form.update_field("Credit_History", "0.0");
        form.update_field("Dependents", "3+");
        let body = payload_for(&form);

        assert_eq!(body.get("Credit_History"), Some(&Value::from(0.0)));
        assert_eq!(body.get("Dependents"), Some(&Value::from("3+")));
        assert_eq!(body.get("Loan_Amount_Term"), Some(&Value::from(360.0)));
        assert!(body.get("loan_percent_income").is_none());
        assert_eq!(body.0.len(), 11);
    }
}
