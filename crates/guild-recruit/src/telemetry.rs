use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events the default filter keeps when the configured level is
/// a bare severity rather than a full directive.
const SERVICE_CRATES: [&str; 2] = ["guild_recruit", "guild_recruit_api"];

#[derive(Debug)]
pub enum TelemetryError {
    Directive { directive: String, source: ParseError },
    AlreadyInitialized(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Directive { directive, .. } => {
                write!(f, "log filter '{directive}' is not a valid directive")
            }
            TelemetryError::AlreadyInitialized(err) => {
                write!(f, "tracing subscriber not installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Directive { source, .. } => Some(source),
            TelemetryError::AlreadyInitialized(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins when set; otherwise the
/// configured level is scoped to the service crates so dependency noise stays
/// out of the default output.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = crate_scoped_directive(&config.log_level);
            EnvFilter::try_new(&directive)
                .map_err(|source| TelemetryError::Directive { directive, source })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInitialized)
}

/// A bare level like `info` becomes `guild_recruit=info,guild_recruit_api=info`;
/// anything already shaped like a directive passes through untouched.
fn crate_scoped_directive(log_level: &str) -> String {
    let trimmed = log_level.trim();
    if trimmed.contains('=') || trimmed.contains(',') {
        return trimmed.to_string();
    }
    SERVICE_CRATES
        .iter()
        .map(|service_crate| format!("{service_crate}={trimmed}"))
        .collect::<Vec<_>>()
        .join(",")
}
