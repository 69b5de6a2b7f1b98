//! Configuration file management for squitter.
//!
//! Reads/writes `~/.squitter/config.yaml` with the receiver's reference
//! position and the default output format.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::CliError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub receiver: ReceiverConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverConfig {
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            receiver: ReceiverConfig {
                name: "default".into(),
                lat: None,
                lon: None,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
            },
        }
    }
}

/// Get the config directory path (`~/.squitter/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".squitter")
}

/// Get the default config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `path`, or defaults if the file doesn't exist.
pub fn load_from(path: &Path) -> Result<Config, CliError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
    Ok(parse_config(&text))
}

/// Write config to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<(), CliError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| CliError::Config(e.to_string()))?;
    }
    fs::write(path, serialize_config(config)).map_err(|e| CliError::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys are ignored.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut section: Option<&str> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');
        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let (key, val) = (key.trim(), val.trim());

        if !is_indented {
            section = if val.is_empty() { Some(key) } else { None };
            continue;
        }

        match (section, key) {
            (Some("receiver"), "name") => {
                if let Some(v) = parse_string_value(val) {
                    config.receiver.name = v;
                }
            }
            (Some("receiver"), "lat") => config.receiver.lat = parse_float_value(val),
            (Some("receiver"), "lon") => config.receiver.lon = parse_float_value(val),
            (Some("output"), "format") => match parse_string_value(val).as_deref() {
                Some("json") => config.output.format = OutputFormat::Json,
                Some("text") | None => config.output.format = OutputFormat::Text,
                Some(other) => warn!("ignoring unknown output format {other:?}"),
            },
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    let unquoted = val
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| val.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(val);
    Some(unquoted.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    parse_string_value(val)?.parse().ok()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let opt = |v: Option<f64>| v.map_or_else(|| "null".to_string(), |v| v.to_string());
    let format = match config.output.format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
    };

    let lines = [
        "# squitter configuration".to_string(),
        String::new(),
        "receiver:".into(),
        format!("  name: \"{}\"", config.receiver.name),
        format!("  lat: {}", opt(config.receiver.lat)),
        format!("  lon: {}", opt(config.receiver.lon)),
        String::new(),
        "output:".into(),
        format!("  format: {format}"),
    ];

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.receiver.name, "default");
        assert!(config.receiver.lat.is_none());
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
receiver:
  name: "schiphol"
  lat: 52.3
  lon: 4.76

output:
  format: json
"#;
        let config = parse_config(text);
        assert_eq!(config.receiver.name, "schiphol");
        assert_eq!(config.receiver.lat, Some(52.3));
        assert_eq!(config.receiver.lon, Some(4.76));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_config_null_values() {
        let text = "receiver:\n  name: 'test'\n  lat: null\n  lon: ~\n";
        let config = parse_config(text);
        assert_eq!(config.receiver.name, "test");
        assert!(config.receiver.lat.is_none());
        assert!(config.receiver.lon.is_none());
    }

    #[test]
    fn test_parse_config_unknown_format_keeps_default() {
        let config = parse_config("output:\n  format: xml\n");
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            receiver: ReceiverConfig {
                name: "test".into(),
                lat: Some(35.5),
                lon: Some(-82.5),
            },
            output: OutputConfig {
                format: OutputFormat::Json,
            },
        };
        save_to(&config, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
