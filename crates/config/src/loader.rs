use std::{fmt::Write, path::Path, str::FromStr};

use anyhow::bail;
use indoc::indoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;
use url::Url;

use crate::Config;

/// Fields whose expansion may fail, typically on an unset environment variable. The
/// field is dropped and the gateway answers chat requests with a configuration error.
const OPTIONAL_ENV_FIELDS: &[&str] = &["llm.backend.account_id", "llm.backend.api_token"];

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let raw_config: Value = toml::from_str(&content)?;

    load_from_value(raw_config)
}

fn load_from_value(mut raw_config: Value) -> anyhow::Result<Config> {
    // Each pass drops at most one optional field; the list bounds the loop.
    for _ in 0..=OPTIONAL_ENV_FIELDS.len() {
        let expanded = expand_dynamic_strings(&mut Vec::new(), &mut raw_config);

        let err = match expanded {
            Ok(()) => return finish(raw_config),
            Err(err) => err,
        };

        if !OPTIONAL_ENV_FIELDS.contains(&err.path.as_str()) {
            return Err(err.into());
        }

        log::warn!("{err}");
        remove_field_from_config(&mut raw_config, &err.path);
    }

    bail!("Failed to expand dynamic strings in the configuration")
}

fn finish(raw_config: Value) -> anyhow::Result<Config> {
    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    let llm = &config.llm;
    let backend = &llm.backend;

    let url = match Url::parse(&backend.base_url) {
        Ok(url) => url,
        Err(e) => bail!("Invalid backend base_url '{}': {e}", backend.base_url),
    };

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Backend base_url must use http or https, got '{}'", url.scheme());
    }

    if backend.default_model.trim().is_empty() {
        bail!(indoc! {r#"
            The backend default_model must not be empty. It is used for every model name
            without an explicit mapping, for example:

              [llm.backend]
              default_model = "@cf/meta/llama-3-8b-instruct"
        "#});
    }

    for (name, target) in &backend.models {
        if target.trim().is_empty() {
            bail!("Model '{name}' maps to an empty backend model identifier");
        }
    }

    for path in [&llm.path, &llm.models_path] {
        if !path.starts_with('/') {
            bail!("Endpoint path '{path}' must start with '/'");
        }
    }

    if llm.path == llm.models_path {
        bail!("The chat and model listing endpoints cannot share the path '{}'", llm.path);
    }

    let health = &config.server.health;

    if health.enabled && health.listen.is_none() && [&llm.path, &llm.models_path].contains(&&health.path) {
        bail!(
            "The health endpoint path '{}' collides with a chat gateway endpoint",
            health.path
        );
    }

    Ok(())
}

#[derive(Debug)]
struct ExpansionError {
    path: String,
    message: String,
}

impl std::fmt::Display for ExpansionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to expand dynamic string at path '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for ExpansionError {}

fn remove_field_from_config(config: &mut Value, path: &str) {
    let mut parts: Vec<&str> = path.split('.').collect();

    let Some(last) = parts.pop() else {
        return;
    };

    let mut current = config;

    for part in parts {
        match current.as_table_mut().and_then(|table| table.get_mut(part)) {
            Some(value) => current = value,
            None => return,
        }
    }

    if let Some(table) = current.as_table_mut() {
        table.remove(last);
        log::debug!("Removed optional field '{path}' due to missing environment variable");
    }
}

fn expand_dynamic_strings<'a>(
    path: &mut Vec<Result<&'a str, usize>>,
    value: &'a mut Value,
) -> Result<(), ExpansionError> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => {
                            let _ = write!(p, "[{i}]");
                        }
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                return Err(ExpansionError {
                    path: p,
                    message: err.to_string(),
                });
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
