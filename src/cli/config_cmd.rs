//! Config command handler

use std::str::FromStr;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, RecorderSection};
use crate::domain::error::{ConfigError, DurationParseError};
use crate::domain::recording::{AudioEncoder, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Read the value of a known key
fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let recorder = config.recorder.as_ref();
    match key {
        "output_dir" => config.output_dir.clone(),
        "duration" => config.duration.clone(),
        "timeout" => config.timeout.clone(),
        "device" => config.device.clone(),
        "recorder.encoder" => recorder.and_then(|r| r.encoder.clone()),
        "recorder.channels" => recorder.and_then(|r| r.channels).map(|n| n.to_string()),
        "recorder.sample_rate" => recorder.and_then(|r| r.sample_rate).map(|n| n.to_string()),
        "recorder.bit_rate" => recorder.and_then(|r| r.bit_rate).map(|n| n.to_string()),
        "recorder.suppress_noise" => recorder.and_then(|r| r.suppress_noise).map(|b| b.to_string()),
        "recorder.cancel_echo" => recorder.and_then(|r| r.cancel_echo).map(|b| b.to_string()),
        "recorder.auto_gain" => recorder.and_then(|r| r.auto_gain).map(|b| b.to_string()),
        _ => None,
    }
}

/// Validate `value` and store it under `key`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "output_dir" => config.output_dir = Some(value.to_string()),
        "device" => config.device = Some(value.to_string()),
        "duration" | "timeout" => {
            let parsed: Duration = value
                .parse()
                .map_err(|e: DurationParseError| invalid(key, e.to_string()))?;
            if key == "duration" {
                config.duration = Some(parsed.to_string());
            } else {
                config.timeout = Some(parsed.to_string());
            }
        }
        _ => {
            let Some(field) = key.strip_prefix("recorder.") else {
                return Err(invalid(key, "Unknown key"));
            };
            let section = config.recorder.get_or_insert_with(RecorderSection::default);
            set_recorder_value(section, key, field, value)?;
        }
    }
    Ok(())
}

fn set_recorder_value(
    section: &mut RecorderSection,
    key: &str,
    field: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match field {
        "encoder" => {
            let encoder =
                AudioEncoder::from_str(value).map_err(|e| invalid(key, e.to_string()))?;
            section.encoder = Some(encoder.to_string());
        }
        "channels" => {
            let channels: u16 = parse_number(key, value)?;
            if !(1..=2).contains(&channels) {
                return Err(invalid(key, "channels can either be 1 or 2"));
            }
            section.channels = Some(channels);
        }
        "sample_rate" => section.sample_rate = Some(parse_positive(key, value)?),
        "bit_rate" => section.bit_rate = Some(parse_positive(key, value)?),
        "suppress_noise" => section.suppress_noise = Some(parse_bool_for(key, value)?),
        "cancel_echo" => section.cancel_echo = Some(parse_bool_for(key, value)?),
        "auto_gain" => section.auto_gain = Some(parse_bool_for(key, value)?),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| invalid(key, format!("Invalid number '{}'", value)))
}

fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    let n: u32 = parse_number(key, value)?;
    if n == 0 {
        return Err(invalid(key, "Value must be greater than zero"));
    }
    Ok(n)
}

fn parse_bool_for(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn set_duration_normalizes() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "duration", "90s").unwrap();
        assert_eq!(config.duration, Some("1m30s".to_string()));
        assert!(set_value(&mut config, "timeout", "soon").is_err());
    }

    #[test]
    fn set_encoder_stores_wire_name() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "recorder.encoder", "AACLC").unwrap();
        assert_eq!(
            get_value(&config, "recorder.encoder"),
            Some("aacLc".to_string())
        );
        assert!(set_value(&mut config, "recorder.encoder", "mp3").is_err());
    }

    #[test]
    fn set_channels_checks_range() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "recorder.channels", "1").unwrap();
        assert_eq!(config.recorder.as_ref().unwrap().channels, Some(1));
        assert!(set_value(&mut config, "recorder.channels", "3").is_err());
        assert!(set_value(&mut config, "recorder.channels", "two").is_err());
    }

    #[test]
    fn set_rates_reject_zero() {
        let mut config = AppConfig::empty();
        assert!(set_value(&mut config, "recorder.sample_rate", "0").is_err());
        set_value(&mut config, "recorder.bit_rate", "64000").unwrap();
        assert_eq!(get_value(&config, "recorder.bit_rate"), Some("64000".to_string()));
    }

    #[test]
    fn set_flags() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "recorder.auto_gain", "yes").unwrap();
        assert_eq!(get_value(&config, "recorder.auto_gain"), Some("true".to_string()));
        assert!(set_value(&mut config, "recorder.cancel_echo", "maybe").is_err());
    }

    #[test]
    fn unset_values_read_as_none() {
        let config = AppConfig::empty();
        for key in VALID_CONFIG_KEYS {
            assert_eq!(get_value(&config, key), None, "{}", key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(check_key("api_key").is_err());
        assert!(check_key("recorder.bit_rate").is_ok());
    }
}
