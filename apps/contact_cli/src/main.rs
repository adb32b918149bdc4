use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use form_core::{load_settings, ContactFormController, FormEvent, TracingRenderer};
use shared::{
    domain::FieldId,
    error::{ErrorCode, FormError},
};
use tracing_subscriber::EnvFilter;

/// Fills in the contact form from the command line and submits it.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "contact_form.toml")]
    config: PathBuf,
    /// Overrides the endpoint from the settings file and environment.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    message: String,
    /// Keep running until the form has reverted to idle.
    #[arg(long)]
    wait_revert: bool,
}

const REVERT_GRACE: Duration = Duration::from_secs(1);

fn exit_code(code: ErrorCode) -> ExitCode {
    match code {
        ErrorCode::Validation => ExitCode::from(2),
        ErrorCode::Transport => ExitCode::from(3),
        ErrorCode::Server => ExitCode::from(4),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config.display()))?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_url = endpoint;
    }
    let revert_delay = settings.revert_delay();
    let controller = ContactFormController::from_settings(&settings, Box::new(TracingRenderer))?;

    // Same order a visitor fills the page: type, then tab away.
    for (field, value) in [
        (FieldId::Name, args.name),
        (FieldId::Email, args.email),
        (FieldId::Message, args.message),
    ] {
        controller.dispatch(FormEvent::input(field, value)).await;
        controller.dispatch(FormEvent::Blur { field }).await;
    }

    let report = controller.submit().await;
    let exit = match report.into_result() {
        Ok(true) => {
            println!("Message sent.");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("Form is busy; nothing was sent.");
            ExitCode::FAILURE
        }
        Err(FormError::Invalid(ref errors)) => {
            for err in errors {
                let display = controller.field(err.field).await;
                eprintln!("{}: {}", err.field, display.error_message);
            }
            exit_code(ErrorCode::Validation)
        }
        Err(err) => {
            eprintln!("{}", controller.submit_control().await.label_text);
            tracing::debug!(error = %err, "submission error detail");
            exit_code(err.code())
        }
    };

    if args.wait_revert
        && !controller
            .wait_until_idle(revert_delay + REVERT_GRACE)
            .await
    {
        tracing::warn!("form did not revert to idle in time");
    }

    Ok(exit)
}
