use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SUBMIT_LABEL: &str = "Send Message";
pub const DEFAULT_ERROR_LABEL: &str = "Error — try again";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid endpoint url '{url}': {reason}")]
    Endpoint { url: String, reason: String },
    #[error("request_timeout_secs must be at least 1")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    pub endpoint_url: String,
    pub revert_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub submit_label: String,
    pub error_label: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "https://formspree.io/f/your-form-id".into(),
            revert_delay_ms: 3000,
            request_timeout_secs: 15,
            submit_label: DEFAULT_SUBMIT_LABEL.into(),
            error_label: DEFAULT_ERROR_LABEL.into(),
        }
    }
}

impl FormSettings {
    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_endpoint(&self) -> bool {
        !self.endpoint_url.trim().is_empty()
    }

    /// Rejects values that would make every submission fail.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        Ok(())
    }

    /// Parses the endpoint; only http and https are accepted.
    pub fn endpoint(&self) -> Result<Url, SettingsError> {
        let raw = self.endpoint_url.trim();
        let url = Url::parse(raw).map_err(|e| SettingsError::Endpoint {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SettingsError::Endpoint {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

/// Defaults, then the TOML file at `path` if it exists, then environment.
pub fn load_settings(path: impl AsRef<Path>) -> Result<FormSettings, SettingsError> {
    let path = path.as_ref();
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => FormSettings::default(),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> Result<FormSettings, toml::de::Error> {
    toml::from_str(raw)
}

fn apply_env_overrides(settings: &mut FormSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONTACT_FORM_ENDPOINT") {
        settings.endpoint_url = v;
    }
    if let Some(v) = var("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(v) = var("APP__REVERT_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.revert_delay_ms = parsed;
        }
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let settings = parse_settings(
            r#"
endpoint_url = "https://formspree.io/f/abc123"
revert_delay_ms = 1500
"#,
        )
        .expect("parse");
        assert_eq!(settings.endpoint_url, "https://formspree.io/f/abc123");
        assert_eq!(settings.revert_delay(), Duration::from_millis(1500));
        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(settings.submit_label, "Send Message");
        assert_eq!(settings.error_label, "Error — try again");
    }

    #[test]
    fn env_overrides_win_and_bad_numbers_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("CONTACT_FORM_ENDPOINT", "http://legacy.example/form"),
            ("APP__ENDPOINT_URL", "https://example.com/f/xyz"),
            ("APP__REVERT_DELAY_MS", "not-a-number"),
            ("APP__REQUEST_TIMEOUT_SECS", "4"),
        ]
        .into_iter()
        .collect();

        let mut settings = FormSettings::default();
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.endpoint_url, "https://example.com/f/xyz");
        assert_eq!(settings.revert_delay_ms, 3000);
        assert_eq!(settings.request_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn endpoint_rejects_non_http_schemes() {
        let mut settings = FormSettings::default();
        assert!(settings.endpoint().is_ok());

        settings.endpoint_url = "ftp://example.com/upload".into();
        assert!(matches!(
            settings.endpoint(),
            Err(SettingsError::Endpoint { .. })
        ));

        settings.endpoint_url = "not a url".into();
        assert!(settings.endpoint().is_err());
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let mut settings = parse_settings("request_timeout_secs = 0").expect("parse");
        assert!(matches!(settings.validate(), Err(SettingsError::ZeroTimeout)));

        settings.request_timeout_secs = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_request_timeout_in_file_fails_to_load() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("contact_form_zero_timeout_{suffix}.toml"));
        fs::write(&path, "request_timeout_secs = 0").expect("write");

        let err = load_settings(&path).expect_err("should fail");
        assert!(matches!(err, SettingsError::ZeroTimeout));

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn blank_endpoint_counts_as_unconfigured() {
        let settings = FormSettings {
            endpoint_url: "   ".into(),
            ..FormSettings::default()
        };
        assert!(!settings.has_endpoint());
        assert!(FormSettings::default().has_endpoint());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("contact_form_missing_{suffix}.toml"));
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.revert_delay_ms, 3000);
    }

    #[test]
    fn unparsable_file_is_reported() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("contact_form_bad_{suffix}.toml"));
        fs::write(&path, "revert_delay_ms = \"soon\"").expect("write");

        let err = load_settings(&path).expect_err("should fail");
        assert!(matches!(err, SettingsError::Parse { .. }));

        fs::remove_file(path).expect("cleanup");
    }
}
