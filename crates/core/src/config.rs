use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CANDIDATE_MODELS: [&str; 4] =
    ["gemini-2.5-flash", "gemini-flash-latest", "gemini-2.0-flash", "gemini-2.0-flash-001"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub sms: SmsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    /// Attempted in order; the first structurally valid reply wins.
    pub candidate_models: Vec<String>,
    pub attempt_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub analytics_window_days: u32,
    pub recent_bills_limit: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_candidate_models: Option<Vec<String>>,
    pub server_port: Option<u16>,
    pub sms_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://snapbill.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                candidate_models: DEFAULT_CANDIDATE_MODELS.iter().map(ToString::to_string).collect(),
                attempt_timeout_secs: 20,
            },
            assistant: AssistantConfig { analytics_window_days: 30, recent_bills_limit: 10 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            sms: SmsConfig {
                enabled: false,
                api_key: None,
                base_url: "https://www.fast2sms.com/dev/bulkV2".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("snapbill.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Effective configuration as JSON with every secret replaced by a marker.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "database": {
                "url": self.database.url,
                "max_connections": self.database.max_connections,
                "timeout_secs": self.database.timeout_secs,
            },
            "llm": {
                "api_key": redact(self.llm.api_key.as_ref()),
                "base_url": self.llm.base_url,
                "candidate_models": self.llm.candidate_models,
                "attempt_timeout_secs": self.llm.attempt_timeout_secs,
            },
            "assistant": {
                "analytics_window_days": self.assistant.analytics_window_days,
                "recent_bills_limit": self.assistant.recent_bills_limit,
            },
            "server": {
                "bind_address": self.server.bind_address,
                "port": self.server.port,
                "graceful_shutdown_secs": self.server.graceful_shutdown_secs,
            },
            "sms": {
                "enabled": self.sms.enabled,
                "api_key": redact(self.sms.api_key.as_ref()),
                "base_url": self.sms.base_url,
            },
            "logging": {
                "level": self.logging.level,
                "format": self.logging.format.as_str(),
            },
        })
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(candidate_models) = llm.candidate_models {
                self.llm.candidate_models = candidate_models;
            }
            if let Some(attempt_timeout_secs) = llm.attempt_timeout_secs {
                self.llm.attempt_timeout_secs = attempt_timeout_secs;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(analytics_window_days) = assistant.analytics_window_days {
                self.assistant.analytics_window_days = analytics_window_days;
            }
            if let Some(recent_bills_limit) = assistant.recent_bills_limit {
                self.assistant.recent_bills_limit = recent_bills_limit;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(sms) = patch.sms {
            if let Some(enabled) = sms.enabled {
                self.sms.enabled = enabled;
            }
            if let Some(api_key) = sms.api_key {
                self.sms.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = sms.base_url {
                self.sms.base_url = base_url;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SNAPBILL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SNAPBILL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("SNAPBILL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SNAPBILL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("SNAPBILL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let llm_api_key = read_env("SNAPBILL_LLM_API_KEY").or_else(|| read_env("GEMINI_API_KEY"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SNAPBILL_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("SNAPBILL_LLM_CANDIDATE_MODELS") {
            self.llm.candidate_models = parse_list(&value);
        }
        if let Some(value) = read_env("SNAPBILL_LLM_ATTEMPT_TIMEOUT_SECS") {
            self.llm.attempt_timeout_secs = parse_u64("SNAPBILL_LLM_ATTEMPT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SNAPBILL_ASSISTANT_ANALYTICS_WINDOW_DAYS") {
            self.assistant.analytics_window_days =
                parse_u32("SNAPBILL_ASSISTANT_ANALYTICS_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("SNAPBILL_ASSISTANT_RECENT_BILLS_LIMIT") {
            self.assistant.recent_bills_limit =
                parse_u32("SNAPBILL_ASSISTANT_RECENT_BILLS_LIMIT", &value)? as usize;
        }

        if let Some(value) = read_env("SNAPBILL_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SNAPBILL_SERVER_PORT") {
            self.server.port = parse_u16("SNAPBILL_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SNAPBILL_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SNAPBILL_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("SNAPBILL_SMS_ENABLED") {
            self.sms.enabled = parse_bool("SNAPBILL_SMS_ENABLED", &value)?;
        }
        let sms_api_key = read_env("SNAPBILL_SMS_API_KEY").or_else(|| read_env("FAST2SMS_API_KEY"));
        if let Some(value) = sms_api_key {
            self.sms.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SNAPBILL_SMS_BASE_URL") {
            self.sms.base_url = value;
        }

        let log_level =
            read_env("SNAPBILL_LOGGING_LEVEL").or_else(|| read_env("SNAPBILL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SNAPBILL_LOGGING_FORMAT").or_else(|| read_env("SNAPBILL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(candidate_models) = overrides.llm_candidate_models {
            self.llm.candidate_models = candidate_models;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(enabled) = overrides.sms_enabled {
            self.sms.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_assistant(&self.assistant)?;
        validate_server(&self.server)?;
        validate_sms(&self.sms)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("snapbill.toml"), PathBuf::from("config/snapbill.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.attempt_timeout_secs == 0 || llm.attempt_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.attempt_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.candidate_models.is_empty()
        || llm.candidate_models.iter().any(|model| model.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "llm.candidate_models must list at least one non-blank model id".to_string(),
        ));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if assistant.analytics_window_days == 0 || assistant.analytics_window_days > 365 {
        return Err(ConfigError::Validation(
            "assistant.analytics_window_days must be in range 1..=365".to_string(),
        ));
    }

    if assistant.recent_bills_limit == 0 || assistant.recent_bills_limit > 100 {
        return Err(ConfigError::Validation(
            "assistant.recent_bills_limit must be in range 1..=100".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_sms(sms: &SmsConfig) -> Result<(), ConfigError> {
    if sms.enabled {
        let missing =
            sms.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "sms.enabled is true but sms.api_key is not configured".to_string(),
            ));
        }
    }

    if !sms.base_url.starts_with("http://") && !sms.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "sms.base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn redact(secret: Option<&SecretString>) -> Option<&'static str> {
    secret.map(|_| "[redacted]")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty()).map(ToString::to_string).collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    assistant: Option<AssistantPatch>,
    server: Option<ServerPatch>,
    sms: Option<SmsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    candidate_models: Option<Vec<String>>,
    attempt_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    analytics_window_days: Option<u32>,
    recent_bills_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmsPatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_a_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.llm.candidate_models.len() == 4, "four default candidate models")?;
        ensure(config.llm.candidate_models[0] == "gemini-2.5-flash", "flash model is tried first")?;
        ensure(config.llm.attempt_timeout_secs == 20, "attempt timeout defaults to 20s")?;
        ensure(config.assistant.analytics_window_days == 30, "window defaults to 30 days")?;
        ensure(config.assistant.recent_bills_limit == 10, "recent bills default to 10")?;
        ensure(!config.sms.enabled, "sms delivery is off by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SNAPBILL_GEMINI_KEY", "gemini-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("snapbill.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_SNAPBILL_GEMINI_KEY}"
candidate_models = ["model-a", "model-b"]
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let key = config.llm.api_key.as_ref().map(|value| value.expose_secret().to_string());
            ensure(key.as_deref() == Some("gemini-from-env"), "api key should be interpolated")?;
            ensure(
                config.llm.candidate_models == vec!["model-a".to_string(), "model-b".to_string()],
                "candidate order should follow the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SNAPBILL_GEMINI_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("snapbill.toml");
        fs::write(&path, "[llm]\napi_key = \"${TEST_SNAPBILL_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_SNAPBILL_UNSET_VAR"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SNAPBILL_LOG_LEVEL", "warn");
        env::set_var("SNAPBILL_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SNAPBILL_LOG_LEVEL", "SNAPBILL_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SNAPBILL_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("SNAPBILL_LLM_CANDIDATE_MODELS", "env-model-a, env-model-b");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("snapbill.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[llm]
candidate_models = ["file-model"]

[server]
port = 9100

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 9100, "file port should win over defaults")?;
            ensure(
                config.llm.candidate_models
                    == vec!["env-model-a".to_string(), "env-model-b".to_string()],
                "env candidate list should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&["SNAPBILL_DATABASE_URL", "SNAPBILL_LLM_CANDIDATE_MODELS"]);
        result
    }

    #[test]
    fn invalid_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SNAPBILL_SERVER_PORT", "not-a-port");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected invalid override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "SNAPBILL_SERVER_PORT"),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["SNAPBILL_SERVER_PORT"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SNAPBILL_SMS_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sms.api_key")
            );
            ensure(has_message, "validation failure should mention sms.api_key")
        })();

        clear_vars(&["SNAPBILL_SMS_ENABLED"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug_or_redaction() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SNAPBILL_LLM_API_KEY", "gemini-secret-value");
        env::set_var("SNAPBILL_SMS_API_KEY", "fast2sms-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");
            let redacted = config.redacted().to_string();

            ensure(!debug.contains("gemini-secret-value"), "debug output should not contain llm key")?;
            ensure(
                !debug.contains("fast2sms-secret-value"),
                "debug output should not contain sms key",
            )?;
            ensure(!redacted.contains("secret-value"), "redacted view should hide secrets")?;
            ensure(redacted.contains("[redacted]"), "redacted view should mark secrets")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["SNAPBILL_LLM_API_KEY", "SNAPBILL_SMS_API_KEY"]);
        result
    }
}
