use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::CoordinatorConfig;
use crate::domain::{AllowList, EngineKind, ProviderDescriptor};
use crate::infrastructure::asr::AsrTimeouts;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Test,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(format!(
                "Invalid environment: {}. Expected: local, test, or prod",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub jobs: JobSettings,
    pub asr: AsrSettings,
    pub enhancement: EnhancementSettings,
    pub diarization: DiarizationSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub providers: Vec<ProviderSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl ServerSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    pub max_local_jobs: usize,
    pub event_buffer: usize,
    pub retry_backoff_ms: u64,
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl JobSettings {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_local_jobs: self.max_local_jobs,
            event_buffer: self.event_buffer,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            job_retention: Duration::from_secs(self.retention_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsrSettings {
    pub timeout_floor_secs: u64,
    pub timeout_per_audio_minute_secs: u64,
    pub whisper_kill_grace_secs: u64,
}

impl AsrSettings {
    pub fn timeouts(&self) -> AsrTimeouts {
        AsrTimeouts {
            floor: Duration::from_secs(self.timeout_floor_secs),
            per_audio_minute: Duration::from_secs(self.timeout_per_audio_minute_secs),
        }
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.whisper_kill_grace_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhancementSettings {
    pub establish_timeout_secs: u64,
}

impl EnhancementSettings {
    pub fn establish_timeout(&self) -> Duration {
        Duration::from_secs(self.establish_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiarizationSettings {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl DiarizationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub enable_json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSetting {
    pub name: String,
    pub kind: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub binary_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub users: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderSetting {
    pub fn into_descriptor(self) -> Result<ProviderDescriptor, String> {
        let kind: EngineKind = self.kind.parse()?;
        // A missing user list means the provider is open to everyone.
        let access = match self.users {
            None => AllowList::All,
            Some(users) => AllowList::Members(users.into_iter().collect()),
        };
        Ok(ProviderDescriptor {
            name: self.name,
            kind,
            endpoint: self.endpoint,
            api_key: self.api_key,
            model: self.model,
            binary_path: self.binary_path,
            model_path: self.model_path,
            enabled: self.enabled,
            access,
        })
    }
}

pub fn load_settings(environment: Environment) -> Result<Settings, ConfigError> {
    let configuration = Config::builder()
        .add_source(
            File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .list_separator(" "),
        )
        .build()?;

    configuration.try_deserialize()
}
