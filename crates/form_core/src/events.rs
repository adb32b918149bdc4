//! User interactions delivered to the controller.

use shared::domain::FieldId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// The field's content changed; carries the full new value.
    Input { field: FieldId, value: String },
    /// The field lost focus.
    Blur { field: FieldId },
    Submit,
}

impl FormEvent {
    pub fn input(field: FieldId, value: impl Into<String>) -> Self {
        FormEvent::Input {
            field,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormEvent::Input { .. } => "input",
            FormEvent::Blur { .. } => "blur",
            FormEvent::Submit => "submit",
        }
    }
}
