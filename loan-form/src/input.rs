use std::fmt;

use crate::{
    form::{FieldValue, FormController},
    schema::{FieldSpec, SelectOption},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Number,
    Text,
}

/// The control a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Input(InputType),
    Select(&'static [SelectOption]),
}

impl Control {
    pub fn for_field(field: &FieldSpec) -> Self {
        if field.is_select() {
            Control::Select(field.options)
        } else if field.kind.is_numeric() {
            Control::Input(InputType::Number)
        } else {
            Control::Input(InputType::Text)
        }
    }

    /// Map raw input to the value handed to the change callback.
    ///
    /// A select picks an option by value, by label (case-insensitive) or by 1-based
    /// position. Anything else is forwarded unchanged.
    pub fn resolve(&self, raw: &str) -> FieldValue {
        if let Control::Select(options) = self {
            let trimmed = raw.trim();
            let by_position = trimmed
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i));
            let picked = options
                .iter()
                .find(|o| o.value == trimmed)
                .or(by_position)
                .or_else(|| {
                    options
                        .iter()
                        .find(|o| o.label.eq_ignore_ascii_case(trimmed))
                });
            if let Some(option) = picked {
                return FieldValue::from(option.value);
            }
        }
        FieldValue::from(raw)
    }
}

/// Label plus control bound to one field's current value. Stateless.
pub struct InputGroup<'a> {
    pub position: usize,
    pub field: &'a FieldSpec,
    pub value: Option<&'a FieldValue>,
}

impl<'a> InputGroup<'a> {
    pub fn new(position: usize, field: &'a FieldSpec, value: Option<&'a FieldValue>) -> Self {
        Self {
            position,
            field,
            value,
        }
    }

    pub fn control(&self) -> Control {
        Control::for_field(self.field)
    }

    /// Change callback: forward the raw input to the form.
    pub fn on_change(&self, form: &mut FormController, raw: &str) {
        form.update_field(self.field.key, self.control().resolve(raw));
    }
}

impl fmt::Display for InputGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.value.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{:>3}. {:<26}", self.position, self.field.label)?;

        match self.control() {
            Control::Input(InputType::Number) => write!(f, "[{}] #", current),
            Control::Input(InputType::Text) => write!(f, "[{}]", current),
            Control::Select(options) => {
                let selected = options
                    .iter()
                    .find(|o| o.value == current)
                    .map(|o| o.label.to_string())
                    .unwrap_or_else(|| current.clone());
                write!(f, "<{}>", selected)?;
                let choices: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| format!("{}) {}", i + 1, o.label))
                    .collect();
                write!(f, "  {}", choices.join("  "))
            }
        }
    }
}
