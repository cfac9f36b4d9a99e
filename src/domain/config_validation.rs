//! Configuration validation.
//!
//! Every key is optional; only values that are present get checked.

use crate::domain::error::KryptoError;
use crate::ports::config_port::{parse_bool, ConfigPort};

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), KryptoError> {
    validate_delimiter(config)?;
    for key in ["asset", "timeframe", "timestamp"] {
        validate_column_name(config, key)?;
    }
    for key in ["assets", "timeframes"] {
        validate_list(config, key)?;
    }
    validate_latest_only(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> KryptoError {
    KryptoError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Resolves a sheet delimiter. `;` starts an INI comment, so the names
/// `comma`, `semicolon` and `tab` are accepted next to single characters.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "comma" => Some(b','),
        "semicolon" => Some(b';'),
        "tab" => Some(b'\t'),
        v if v.len() == 1 && v.is_ascii() => v.bytes().next(),
        _ => None,
    }
}

fn validate_delimiter(config: &dyn ConfigPort) -> Result<(), KryptoError> {
    if let Some(value) = config.get_string("data", "delimiter") {
        if parse_delimiter(&value).is_none() {
            return Err(invalid(
                "data",
                "delimiter",
                "expected a single ASCII character, comma, semicolon or tab",
            ));
        }
    }
    Ok(())
}

fn validate_column_name(config: &dyn ConfigPort, key: &str) -> Result<(), KryptoError> {
    if let Some(value) = config.get_string("columns", key) {
        if value.trim().is_empty() {
            return Err(invalid("columns", key, "column name must not be blank"));
        }
    }
    Ok(())
}

fn validate_list(config: &dyn ConfigPort, key: &str) -> Result<(), KryptoError> {
    if let Some(items) = config.get_list("filter", key) {
        if items.iter().any(|i| i.is_empty()) {
            return Err(invalid("filter", key, "list contains an empty entry"));
        }
    }
    Ok(())
}

fn validate_latest_only(config: &dyn ConfigPort) -> Result<(), KryptoError> {
    if let Some(value) = config.get_string("filter", "latest_only") {
        if parse_bool(&value).is_none() {
            return Err(invalid(
                "filter",
                "latest_only",
                "expected true/false, yes/no or 1/0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use std::collections::HashMap;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    /// Holds raw values verbatim, including blank ones.
    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn with(section: &str, key: &str, value: &str) -> Self {
            let mut map = HashMap::new();
            map.insert((section.to_string(), key.to_string()), value.to_string());
            Self(map)
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[data]
dir = ./sheets
delimiter = semicolon

[columns]
asset = Coin
timeframe = Zeitrahmen
timestamp = Bewertungszeit

[filter]
assets = BTC, ETH
timeframes = 1D
latest_only = no
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_config(&make_config("")).is_ok());
    }

    #[test]
    fn blank_column_name_fails() {
        let config = MapConfig::with("columns", "timeframe", "   ");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigInvalid { key, .. } if key == "timeframe"));
    }

    #[test]
    fn empty_list_entry_fails() {
        let config = make_config("[filter]\nassets = BTC,,ETH\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigInvalid { key, .. } if key == "assets"));
    }

    #[test]
    fn trailing_comma_fails() {
        let config = make_config("[filter]\ntimeframes = 1D,\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigInvalid { key, .. } if key == "timeframes"));
    }

    #[test]
    fn non_boolean_latest_only_fails() {
        let config = make_config("[filter]\nlatest_only = sometimes\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigInvalid { key, .. } if key == "latest_only"));
    }

    #[test]
    fn delimiter_names_and_characters() {
        assert_eq!(parse_delimiter("semicolon"), Some(b';'));
        assert_eq!(parse_delimiter(" Tab "), Some(b'\t'));
        assert_eq!(parse_delimiter("|"), Some(b'|'));
        assert_eq!(parse_delimiter("ä"), None);
        assert_eq!(parse_delimiter(""), None);
    }

    #[test]
    fn unknown_delimiter_fails() {
        let config = make_config("[data]\ndelimiter = pipe\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigInvalid { key, .. } if key == "delimiter"));
    }
}
