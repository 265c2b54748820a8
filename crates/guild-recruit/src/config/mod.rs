use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub recruitment: RecruitmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            recruitment: RecruitmentConfig::load_from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Display and policy values for the recruitment workflow: the cooldown
/// window, the application form, and the canned reviewer replies. All are
/// consumed as opaque display/config values by the core.
#[derive(Debug, Clone)]
pub struct RecruitmentConfig {
    pub cooldown: Duration,
    pub form: FormConfig,
    pub messages: ReplyMessages,
}

/// The five question prompts plus the form's title and accent color.
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub title: String,
    pub accent: String,
    pub prompts: [String; 5],
}

/// Canned reply texts surfaced to applicants and reviewers.
#[derive(Debug, Clone)]
pub struct ReplyMessages {
    pub submitted: String,
    pub accepted: String,
    pub rejected: String,
}

/// Longest accepted `APP_COOLDOWN`: one year.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(365 * 24 * 3600);

const DEFAULT_PROMPTS: [&str; 5] = [
    "What should we call you?",
    "How old are you?",
    "Why do you want to join the staff team?",
    "What relevant experience do you have?",
    "How many hours per week can you be active?",
];

impl RecruitmentConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let raw_cooldown = env::var("APP_COOLDOWN").unwrap_or_else(|_| "24h".to_string());
        let cooldown =
            humantime::parse_duration(raw_cooldown.trim()).map_err(|source| {
                ConfigError::InvalidCooldown {
                    value: raw_cooldown.clone(),
                    source,
                }
            })?;
        if cooldown > MAX_COOLDOWN {
            return Err(ConfigError::CooldownTooLong {
                value: raw_cooldown,
            });
        }

        let prompts = std::array::from_fn(|index| {
            env::var(format!("APP_FORM_Q{}", index + 1))
                .unwrap_or_else(|_| DEFAULT_PROMPTS[index].to_string())
        });

        Ok(Self {
            cooldown,
            form: FormConfig {
                title: env::var("APP_FORM_TITLE")
                    .unwrap_or_else(|_| "Staff Application".to_string()),
                accent: env::var("APP_FORM_ACCENT").unwrap_or_else(|_| "#0099ff".to_string()),
                prompts,
            },
            messages: ReplyMessages {
                submitted: env::var("APP_SUBMITTED_MESSAGE").unwrap_or_else(|_| {
                    "Your application has been submitted for review.".to_string()
                }),
                accepted: env::var("APP_ACCEPTED_MESSAGE")
                    .unwrap_or_else(|_| "Application accepted:".to_string()),
                rejected: env::var("APP_REJECTED_MESSAGE")
                    .unwrap_or_else(|_| "Application rejected:".to_string()),
            },
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCooldown { value: String, source: humantime::DurationError },
    CooldownTooLong { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCooldown { value, .. } => {
                write!(f, "APP_COOLDOWN '{value}' is not a valid duration")
            }
            ConfigError::CooldownTooLong { value } => {
                write!(f, "APP_COOLDOWN '{value}' exceeds the one year maximum")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidCooldown { source, .. } => Some(source),
            ConfigError::CooldownTooLong { .. } => None,
        }
    }
}
