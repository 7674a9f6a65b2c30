//! Logging setup and the configuration report printed by `check`.

use std::io;

use openwechat::{ClientConfig, config::CredentialConfig};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for terminals.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything other than `json` selects pretty output.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") { Self::Json } else { Self::Pretty }
    }
}

/// Installs the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// The level comes from `RUST_LOG` and defaults to `warn`.
pub fn init_observability(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

/// Overall verdict of a configuration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Every credential is usable for every bundled endpoint.
    Ready,
    /// Some endpoints will fail for some credentials.
    Degraded,
    /// The configuration cannot be used.
    Unusable,
}

impl CheckStatus {
    /// Returns the JSON label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Degraded => "degraded",
            Self::Unusable => "unusable",
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Check passed.
    Pass,
    /// Usable with restrictions.
    Warn,
    /// Check failed.
    Fail,
}

impl Outcome {
    /// Returns the JSON label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

/// One named check.
#[derive(Debug, Clone)]
pub struct Check {
    /// What was checked, such as `wx1.sign_key`.
    pub name: String,
    /// Result.
    pub outcome: Outcome,
    /// Details for warnings and failures.
    pub message: Option<String>,
}

impl Check {
    fn pass(name: impl Into<String>) -> Self {
        Self { name: name.into(), outcome: Outcome::Pass, message: None }
    }

    fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), outcome: Outcome::Warn, message: Some(message.into()) }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), outcome: Outcome::Fail, message: Some(message.into()) }
    }
}

/// Report over a loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigReport {
    /// Overall verdict.
    pub status: CheckStatus,
    /// CLI version.
    pub version: String,
    /// Individual checks.
    pub checks: Vec<Check>,
}

impl ConfigReport {
    /// Checks a configuration that already passed [`ClientConfig::validate`].
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut checks = vec![Check::pass("http")];

        if config.credentials.is_empty() {
            checks.push(Check::fail("credentials", "no credentials configured"));
        }
        for credential in &config.credentials {
            checks.extend(credential_checks(credential));
        }

        Self {
            status: Self::compute_status(&checks),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            checks,
        }
    }

    /// Derives the verdict from individual checks.
    #[must_use]
    pub fn compute_status(checks: &[Check]) -> CheckStatus {
        if checks.iter().any(|c| c.outcome == Outcome::Fail) {
            CheckStatus::Unusable
        } else if checks.iter().any(|c| c.outcome == Outcome::Warn) {
            CheckStatus::Degraded
        } else {
            CheckStatus::Ready
        }
    }

    /// Serializes the report.
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::json!({
            "status": self.status.as_str(),
            "version": self.version,
            "checks": self.checks.iter().map(|c| {
                let mut obj = serde_json::json!({
                    "name": c.name,
                    "status": c.outcome.as_str(),
                });
                if let Some(msg) = &c.message {
                    obj["message"] = serde_json::Value::String(msg.clone());
                }
                obj
            }).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&json)
    }
}

fn credential_checks(credential: &CredentialConfig) -> Vec<Check> {
    let app_id = &credential.app_id;
    let mut checks = vec![Check::pass(format!("{app_id}.app_secret"))];

    if credential.sign_key.is_empty() {
        checks.push(Check::warn(
            format!("{app_id}.sign_key"),
            "no merchant key: signed endpoints will fail",
        ));
    } else {
        checks.push(Check::pass(format!("{app_id}.sign_key")));
    }

    match &credential.certificate_path {
        None => checks.push(Check::warn(
            format!("{app_id}.certificate"),
            "no client certificate: certificate-protected endpoints will fail",
        )),
        Some(path) if path.is_file() => checks.push(Check::pass(format!("{app_id}.certificate"))),
        Some(path) => checks.push(Check::fail(
            format!("{app_id}.certificate"),
            format!("{} is not a readable file", path.display()),
        )),
    }

    checks
}
