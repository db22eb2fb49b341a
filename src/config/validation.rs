use crate::config::types::{Config, InstanceConfig, TargetConfig};
use crate::crawler::parse_schedule;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> crate::ConfigResult<()> {
    if config.instances.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[instances]] entry is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for instance in &config.instances {
        validate_instance(instance)?;

        if !names.insert(instance.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "instance name '{}' is used more than once",
                instance.name
            )));
        }
    }

    Ok(())
}

/// Validates one instance entry
fn validate_instance(instance: &InstanceConfig) -> crate::ConfigResult<()> {
    if instance.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "instance name cannot be empty".to_string(),
        ));
    }

    validate_base_url(&instance.name, &instance.base_url)?;

    if instance.token_id.is_empty() || instance.token_secret.is_empty() {
        return Err(ConfigError::Validation(format!(
            "[{}] token-id and token-secret cannot be empty",
            instance.name
        )));
    }

    if instance.backup_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!(
            "[{}] backup-path cannot be empty",
            instance.name
        )));
    }

    if instance.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "[{}] request-timeout must be >= 1 second, got {}",
            instance.name, instance.request_timeout
        )));
    }

    parse_schedule(&instance.schedule).map_err(|e| {
        ConfigError::InvalidSchedule(format!(
            "[{}] '{}': {}",
            instance.name, instance.schedule, e
        ))
    })?;

    validate_target(&instance.name, &instance.target)
}

/// Validates the base URL: must parse and use http(s)
fn validate_base_url(name: &str, base_url: &str) -> crate::ConfigResult<()> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("[{}] '{}': {}", name, base_url, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl(format!(
            "[{}] '{}' must use http or https, got {}",
            name, base_url, scheme
        ))),
    }
}

/// Validates the target block
fn validate_target(name: &str, target: &TargetConfig) -> crate::ConfigResult<()> {
    target
        .resolve()
        .map_err(|e| ConfigError::InvalidTarget(format!("[{}] {}", name, e)))?;

    if target.ids.is_empty() {
        return Err(ConfigError::InvalidTarget(format!(
            "[{}] target ids cannot be empty",
            name
        )));
    }

    Ok(())
}
