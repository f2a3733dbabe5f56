use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use snapbill_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// Legacy variable names still honoured next to the `SNAPBILL_*` form.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("llm.api_key", "GEMINI_API_KEY"),
    ("sms.api_key", "FAST2SMS_API_KEY"),
    ("logging.level", "SNAPBILL_LOG_LEVEL"),
    ("logging.format", "SNAPBILL_LOG_FORMAT"),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut entries = Vec::new();
    flatten("", &config.redacted(), &mut entries);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value) in entries {
        let source =
            field_source(&key_path, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(&key_path, &value, source));
    }

    lines.join("\n")
}

fn flatten(prefix: &str, value: &JsonValue, out: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let path =
                    if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten(&path, child, out);
            }
        }
        JsonValue::String(text) => out.push((prefix.to_string(), text.clone())),
        JsonValue::Array(items) => {
            let joined = items
                .iter()
                .map(|item| item.as_str().map(ToString::to_string).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            out.push((prefix.to_string(), format!("[{joined}]")));
        }
        JsonValue::Null => out.push((prefix.to_string(), "<unset>".to_string())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn env_keys(key_path: &str) -> Vec<String> {
    let mut keys = vec![format!("SNAPBILL_{}", key_path.replace('.', "_").to_ascii_uppercase())];
    keys.extend(
        ENV_ALIASES
            .iter()
            .filter(|(path, _)| *path == key_path)
            .map(|(_, alias)| (*alias).to_string()),
    );
    keys
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("snapbill.toml"), PathBuf::from("config/snapbill.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys(key_path).into_iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
