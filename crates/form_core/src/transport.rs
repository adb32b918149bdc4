use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, multipart::Form, Client};
use serde::Deserialize;
use shared::{
    domain::{FieldId, SubmissionOutcome},
    error::SubmitError,
};
use tracing::debug;
use url::Url;

/// Field values captured at the moment the form entered Submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPayload {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl FormPayload {
    pub fn get(&self, field: FieldId) -> &str {
        match field {
            FieldId::Name => &self.name,
            FieldId::Email => &self.email,
            FieldId::Message => &self.message,
        }
    }

    pub fn parts(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FieldId::ALL
            .into_iter()
            .map(move |field| (field.form_name(), self.get(field)))
    }

    fn to_multipart(&self) -> Form {
        self.parts().fold(Form::new(), |form, (name, value)| {
            form.text(name, value.to_string())
        })
    }
}

#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, payload: &FormPayload) -> Result<(), SubmitError>;
}

/// Stands in when no endpoint is configured; every submission fails.
pub struct MissingSubmissionTransport;

#[async_trait]
impl SubmissionTransport for MissingSubmissionTransport {
    async fn submit(&self, _payload: &FormPayload) -> Result<(), SubmitError> {
        Err(SubmitError::transport("no submission endpoint configured"))
    }
}

// Error body shape returned by Formspree-style endpoints.
#[derive(Debug, Default, Deserialize)]
struct EndpointErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<EndpointFieldError>,
}

#[derive(Debug, Deserialize)]
struct EndpointFieldError {
    message: String,
}

fn error_detail(body: &str) -> Option<String> {
    let parsed: EndpointErrorBody = serde_json::from_str(body).ok()?;
    if !parsed.errors.is_empty() {
        let joined = parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Some(joined);
    }
    parsed.error
}

/// POSTs the form as multipart data and asks for a JSON answer.
pub struct HttpSubmissionTransport {
    http: Client,
    endpoint: Url,
}

impl HttpSubmissionTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn submit(&self, payload: &FormPayload) -> Result<(), SubmitError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .multipart(payload.to_multipart())
            .send()
            .await
            .map_err(|e| SubmitError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(status, endpoint = %self.endpoint, "submission answered");
        if SubmissionOutcome::from_status(status).is_success() {
            return Ok(());
        }

        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| error_detail(&body));
        Err(SubmitError::Server { status, detail })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
