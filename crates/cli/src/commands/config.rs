use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use billgate_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::text(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key_path: "llm.api_key",
            value: api_key,
            env_keys: &["BILLGATE_LLM_API_KEY", "GEMINI_API_KEY"],
        },
        Field {
            key_path: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["BILLGATE_LLM_BASE_URL"],
        },
        Field {
            key_path: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["BILLGATE_LLM_MODEL"],
        },
        Field {
            key_path: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["BILLGATE_LLM_TIMEOUT_SECS"],
        },
        Field {
            key_path: "backend.base_url",
            value: config.backend.base_url.clone(),
            env_keys: &["BILLGATE_BACKEND_BASE_URL"],
        },
        Field {
            key_path: "backend.username",
            value: config.backend.username.clone(),
            env_keys: &["BILLGATE_BACKEND_USERNAME", "API_USERNAME"],
        },
        Field {
            key_path: "backend.token_ttl_secs",
            value: config.backend.token_ttl_secs.to_string(),
            env_keys: &["BILLGATE_BACKEND_TOKEN_TTL_SECS"],
        },
        Field {
            key_path: "backend.timeout_secs",
            value: config.backend.timeout_secs.to_string(),
            env_keys: &["BILLGATE_BACKEND_TIMEOUT_SECS"],
        },
        Field {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["BILLGATE_SERVER_BIND_ADDRESS"],
        },
        Field {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["BILLGATE_SERVER_PORT", "PORT"],
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["BILLGATE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["BILLGATE_LOGGING_LEVEL", "BILLGATE_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["BILLGATE_LOGGING_FORMAT", "BILLGATE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["billgate.toml", "config/billgate.toml"].into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

/// Keeps at most the last four characters of a long key.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() < 12 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
