//! View model handed to the host page and the sink trait that applies it.

use shared::domain::{FieldId, FormSubmissionState};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDisplay {
    pub value: String,
    pub error_message: String,
    pub has_error: bool,
}

/// Submit button with its label, loading and success sub-elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label_visible: bool,
    pub label_text: String,
    pub loading_visible: bool,
    pub success_visible: bool,
}

impl SubmitControl {
    pub fn ready(label: impl Into<String>) -> Self {
        Self {
            enabled: true,
            label_visible: true,
            label_text: label.into(),
            loading_visible: false,
            success_visible: false,
        }
    }
}

/// Host-side binding of the form's elements.
///
/// The controller calls these after every change to the corresponding part of
/// the view model; implementations only copy the values into their widgets.
pub trait FormRenderer: Send {
    fn field_changed(&mut self, field: FieldId, display: &FieldDisplay);
    fn submit_changed(&mut self, control: &SubmitControl);
    fn state_changed(&mut self, _state: FormSubmissionState) {}
}

pub struct NullRenderer;

impl FormRenderer for NullRenderer {
    fn field_changed(&mut self, _field: FieldId, _display: &FieldDisplay) {}

    fn submit_changed(&mut self, _control: &SubmitControl) {}
}

/// Writes every view change to the log. Used by terminal hosts.
pub struct TracingRenderer;

impl FormRenderer for TracingRenderer {
    fn field_changed(&mut self, field: FieldId, field_display: &FieldDisplay) {
        if field_display.has_error {
            info!(field = %field, error = %field_display.error_message, "field invalid");
        } else {
            info!(field = %field, "field ok");
        }
    }

    fn submit_changed(&mut self, control: &SubmitControl) {
        let shown = if control.loading_visible {
            "loading"
        } else if control.success_visible {
            "success"
        } else {
            control.label_text.as_str()
        };
        info!(enabled = control.enabled, shown, "submit control");
    }

    fn state_changed(&mut self, state: FormSubmissionState) {
        info!(?state, "form state");
    }
}
