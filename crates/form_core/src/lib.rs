use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{Context, Result};
use shared::{
    domain::{FieldId, FormSubmissionState, SubmissionOutcome},
    error::{FormError, SubmitError, ValidationError},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

pub mod config;
pub mod events;
pub mod render;
pub mod revert;
pub mod transport;
pub mod validation;

pub use config::{load_settings, FormSettings, SettingsError};
pub use events::FormEvent;
pub use render::{FieldDisplay, FormRenderer, NullRenderer, SubmitControl, TracingRenderer};
pub use transport::{
    FormPayload, HttpSubmissionTransport, MissingSubmissionTransport, SubmissionTransport,
};
pub use validation::FieldSpec;

use revert::RevertTimer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub revert_delay: Duration,
    pub submit_label: String,
    pub error_label: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&FormSettings::default())
    }
}

impl From<&FormSettings> for ControllerOptions {
    fn from(settings: &FormSettings) -> Self {
        Self {
            revert_delay: settings.revert_delay(),
            submit_label: settings.submit_label.clone(),
            error_label: settings.error_label.clone(),
        }
    }
}

/// What a submit event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// The submit control was disabled in this state.
    Ignored(FormSubmissionState),
    /// At least one field failed validation; nothing was sent.
    Rejected(Vec<ValidationError>),
    /// The request went out and resolved.
    Sent(Result<(), SubmitError>),
}

impl SubmitReport {
    pub fn outcome(&self) -> Option<SubmissionOutcome> {
        match self {
            SubmitReport::Sent(Ok(())) => Some(SubmissionOutcome::Success),
            SubmitReport::Sent(Err(err)) => Some(err.outcome()),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<bool, FormError> {
        match self {
            SubmitReport::Ignored(_) => Ok(false),
            SubmitReport::Rejected(errors) => Err(FormError::Invalid(errors)),
            SubmitReport::Sent(Ok(())) => Ok(true),
            SubmitReport::Sent(Err(err)) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub state: FormSubmissionState,
    pub fields: Vec<(FieldId, FieldDisplay)>,
    pub submit: SubmitControl,
}

impl FormSnapshot {
    pub fn field(&self, field: FieldId) -> Option<&FieldDisplay> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, display)| display)
    }
}

struct FormInner {
    fields: [FieldSpec; 3],
    state: FormSubmissionState,
    submit: SubmitControl,
    options: ControllerOptions,
    revert: RevertTimer,
    renderer: Box<dyn FormRenderer>,
    state_tx: watch::Sender<FormSubmissionState>,
}

impl FormInner {
    fn new(
        options: ControllerOptions,
        renderer: Box<dyn FormRenderer>,
        state_tx: watch::Sender<FormSubmissionState>,
    ) -> Self {
        Self {
            fields: FieldId::ALL.map(FieldSpec::new),
            state: FormSubmissionState::Idle,
            submit: SubmitControl::ready(options.submit_label.clone()),
            options,
            revert: RevertTimer::new(),
            renderer,
            state_tx,
        }
    }

    fn field(&self, field: FieldId) -> &FieldSpec {
        &self.fields[field_index(field)]
    }

    fn field_mut(&mut self, field: FieldId) -> &mut FieldSpec {
        &mut self.fields[field_index(field)]
    }

    fn display(&self, field: FieldId) -> FieldDisplay {
        let spec = self.field(field);
        FieldDisplay {
            value: spec.value().to_string(),
            error_message: spec
                .last_result()
                .map(|result| result.message().to_string())
                .unwrap_or_default(),
            has_error: spec.in_error(),
        }
    }

    fn render_field(&mut self, field: FieldId) {
        let display = self.display(field);
        self.renderer.field_changed(field, &display);
    }

    fn render_submit(&mut self) {
        self.renderer.submit_changed(&self.submit);
    }

    fn set_state(&mut self, next: FormSubmissionState) {
        let previous = self.state;
        if previous == next {
            return;
        }
        if previous.is_transient() && self.revert.is_pending() {
            self.revert.cancel();
            debug!(?previous, "pending revert cancelled");
        }
        self.state = next;
        debug!(?previous, ?next, "form state transition");
        self.renderer.state_changed(next);
        self.state_tx.send_replace(next);
    }

    fn validate_field(&mut self, field: FieldId) -> bool {
        let valid = self.field_mut(field).revalidate().is_valid();
        debug!(field = %field, valid, "field validated");
        self.render_field(field);
        valid
    }

    // Every field is validated so all errors show at once.
    fn validate_all(&mut self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for field in FieldId::ALL {
            if !self.validate_field(field) {
                errors.extend(self.field(field).validation_error());
            }
        }
        errors
    }

    fn payload(&self) -> FormPayload {
        FormPayload {
            name: self.field(FieldId::Name).value().to_string(),
            email: self.field(FieldId::Email).value().to_string(),
            message: self.field(FieldId::Message).value().to_string(),
        }
    }

    fn restore_label(&mut self) {
        if self.submit.label_text != self.options.submit_label {
            self.submit.label_text = self.options.submit_label.clone();
            self.render_submit();
        }
    }

    fn enter_submitting(&mut self) {
        self.set_state(FormSubmissionState::Submitting);
        self.submit.enabled = false;
        self.submit.label_visible = false;
        self.submit.loading_visible = true;
        self.submit.success_visible = false;
        self.render_submit();
    }

    fn enter_success(&mut self) {
        self.submit.loading_visible = false;
        self.submit.success_visible = true;
        self.render_submit();
        for field in FieldId::ALL {
            self.field_mut(field).reset();
            self.render_field(field);
        }
        self.set_state(FormSubmissionState::Success);
    }

    fn enter_failed(&mut self) {
        self.submit.loading_visible = false;
        self.submit.label_visible = true;
        self.submit.label_text = self.options.error_label.clone();
        self.submit.enabled = true;
        self.render_submit();
        self.set_state(FormSubmissionState::Failed);
    }

    fn revert_to_idle(&mut self, generation: u64) {
        if !self.revert.take_fired(generation) {
            debug!(generation, "stale revert discarded");
            return;
        }
        match self.state {
            FormSubmissionState::Success => {
                self.submit.success_visible = false;
                self.submit.label_visible = true;
                self.submit.label_text = self.options.submit_label.clone();
                self.submit.enabled = true;
            }
            FormSubmissionState::Failed => {
                self.submit.label_text = self.options.submit_label.clone();
            }
            state => {
                debug!(?state, "revert fired outside a transient state");
                return;
            }
        }
        self.render_submit();
        self.set_state(FormSubmissionState::Idle);
    }
}

fn field_index(field: FieldId) -> usize {
    match field {
        FieldId::Name => 0,
        FieldId::Email => 1,
        FieldId::Message => 2,
    }
}

/// One contact form: its fields, error display and submission lifecycle.
///
/// Cloning yields another handle to the same form. Field events can be
/// dispatched from one handle while another is awaiting a submission.
#[derive(Clone)]
pub struct ContactFormController {
    inner: Arc<Mutex<FormInner>>,
    transport: Arc<dyn SubmissionTransport>,
    state_rx: watch::Receiver<FormSubmissionState>,
}

impl ContactFormController {
    pub fn new(
        options: ControllerOptions,
        transport: Arc<dyn SubmissionTransport>,
        renderer: Box<dyn FormRenderer>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(FormSubmissionState::Idle);
        Self {
            inner: Arc::new(Mutex::new(FormInner::new(options, renderer, state_tx))),
            transport,
            state_rx,
        }
    }

    /// Builds a controller that posts to the endpoint named in `settings`.
    /// With no endpoint configured, every submission ends in Failed.
    pub fn from_settings(settings: &FormSettings, renderer: Box<dyn FormRenderer>) -> Result<Self> {
        settings.validate()?;
        let transport: Arc<dyn SubmissionTransport> = if settings.has_endpoint() {
            let endpoint = settings.endpoint()?;
            Arc::new(
                HttpSubmissionTransport::new(endpoint, settings.request_timeout())
                    .context("failed to build submission http client")?,
            )
        } else {
            warn!("no submission endpoint configured");
            Arc::new(MissingSubmissionTransport)
        };
        Ok(Self::new(ControllerOptions::from(settings), transport, renderer))
    }

    /// Delivers one user interaction. Only `Submit` produces a report.
    pub async fn dispatch(&self, event: FormEvent) -> Option<SubmitReport> {
        debug!(event = event.name(), "form event");
        match event {
            FormEvent::Input { field, value } => {
                self.input(field, value).await;
                None
            }
            FormEvent::Blur { field } => {
                self.blur(field).await;
                None
            }
            FormEvent::Submit => Some(self.submit().await),
        }
    }

    /// Stores the new value; revalidates only a field already showing an error.
    pub async fn input(&self, field: FieldId, value: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.field_mut(field).set_value(value);
        if inner.field(field).in_error() {
            inner.validate_field(field);
        }
    }

    pub async fn blur(&self, field: FieldId) -> bool {
        self.inner.lock().await.validate_field(field)
    }

    pub async fn submit(&self) -> SubmitReport {
        let payload = {
            let mut inner = self.inner.lock().await;
            if !inner.state.accepts_submit() {
                debug!(state = ?inner.state, "submit ignored while control is disabled");
                return SubmitReport::Ignored(inner.state);
            }

            inner.set_state(FormSubmissionState::Validating);
            let errors = inner.validate_all();
            if !errors.is_empty() {
                inner.restore_label();
                inner.set_state(FormSubmissionState::Idle);
                info!(invalid = errors.len(), "submission blocked by validation");
                return SubmitReport::Rejected(errors);
            }

            inner.enter_submitting();
            inner.payload()
        };

        info!("submitting contact form");
        let result = self.transport.submit(&payload).await;

        let outcome = match &result {
            Ok(()) => SubmissionOutcome::Success,
            Err(err) => err.outcome(),
        };
        match &result {
            Ok(()) => info!("contact form submitted"),
            Err(SubmitError::Server {
                status,
                detail: Some(detail),
            }) => warn!(status, detail = %detail, "contact form submission failed"),
            Err(err) => warn!(error = %err, code = ?err.code(), "contact form submission failed"),
        }

        let mut inner = self.inner.lock().await;
        match outcome.resulting_state() {
            FormSubmissionState::Success => inner.enter_success(),
            _ => inner.enter_failed(),
        }
        self.schedule_revert(&mut inner);
        SubmitReport::Sent(result)
    }

    fn schedule_revert(&self, inner: &mut FormInner) {
        let weak: Weak<Mutex<FormInner>> = Arc::downgrade(&self.inner);
        let delay = inner.options.revert_delay;
        inner.revert.schedule(delay, move |generation| async move {
            if let Some(inner) = weak.upgrade() {
                inner.lock().await.revert_to_idle(generation);
            }
        });
    }

    /// Receiver that observes every state transition, including timed reverts.
    pub fn subscribe_state(&self) -> watch::Receiver<FormSubmissionState> {
        self.state_rx.clone()
    }

    /// Waits until the form is back in Idle, or `limit` elapses.
    pub async fn wait_until_idle(&self, limit: Duration) -> bool {
        let mut states = self.subscribe_state();
        tokio::time::timeout(
            limit,
            states.wait_for(|state| *state == FormSubmissionState::Idle),
        )
        .await
        .is_ok_and(|changed| changed.is_ok())
    }

    pub async fn state(&self) -> FormSubmissionState {
        self.inner.lock().await.state
    }

    pub async fn field(&self, field: FieldId) -> FieldDisplay {
        self.inner.lock().await.display(field)
    }

    pub async fn submit_control(&self) -> SubmitControl {
        self.inner.lock().await.submit.clone()
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let inner = self.inner.lock().await;
        FormSnapshot {
            state: inner.state,
            fields: FieldId::ALL
                .into_iter()
                .map(|field| (field, inner.display(field)))
                .collect(),
            submit: inner.submit.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
