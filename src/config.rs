//! permaqr runtime configuration handling

use crate::error::{Error, Result};
use crate::qr::{EcLevel, MAX_VERSION, MIN_VERSION, QrEncoder, QrRenderer, parse_color};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// URL encoded when nothing else is configured
pub const DEFAULT_URL: &str = "https://sheffmsg.fun";
/// File written when nothing else is configured
pub const DEFAULT_OUTPUT: &str = "my_permanent_qr.png";

/// Top-level configuration structure loaded from disk or environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermaqrConfig {
    /// Text or URL to encode
    pub url: String,
    /// Destination PNG path
    pub output: PathBuf,
    /// Symbol and rendering parameters
    pub qr: QrOptions,
    /// Decode the rendered image before writing it
    pub verify: bool,
    /// Logging configuration
    pub logging: LoggingOptions,
    /// File this configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for PermaqrConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            qr: QrOptions::default(),
            verify: false,
            logging: LoggingOptions::default(),
            source: None,
        }
    }
}

impl PermaqrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_file()?,
        };
        let mut config = match path {
            Some(path) => {
                let mut config = Self::from_file(&path)?;
                config.source = Some(path);
                config
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["permaqr.toml", "permaqr.yaml", "permaqr.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("permaqr");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    ///
    /// A variable that is set but does not parse is an error rather than
    /// being ignored.
    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("PERMAQR_URL") {
            self.url = url;
        }
        if let Some(output) = lookup("PERMAQR_OUTPUT") {
            self.output = PathBuf::from(output);
        }
        if let Some(verify) = env_value(&lookup, "PERMAQR_VERIFY", parse_flag)? {
            self.verify = verify;
        }
        self.qr.apply_overrides(&lookup)?;
        self.logging.apply_overrides(&lookup)
    }

    /// Check every option is usable before any work is done
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Config("url must not be empty".to_string()));
        }
        self.qr.validate()
    }
}

/// Symbol and rendering parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Symbol version (1-40); a lower bound when `fit` is set
    pub version: u8,
    /// Error correction level
    pub ec_level: EcLevel,
    /// Pixels per module
    pub box_size: u32,
    /// Quiet zone width in modules
    pub border: u32,
    /// Allow upgrading the version until the payload fits
    pub fit: bool,
    /// CSS colour of dark modules
    pub fill_color: String,
    /// CSS colour of light modules and the quiet zone
    pub back_color: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            version: 2,
            ec_level: EcLevel::H,
            box_size: 10,
            border: 2,
            fit: true,
            fill_color: "black".to_string(),
            back_color: "white".to_string(),
        }
    }
}

impl QrOptions {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(version) = env_value(lookup, "PERMAQR_VERSION", |v| v.parse::<u8>().ok())? {
            self.version = version;
        }
        if let Some(level) = env_value(lookup, "PERMAQR_EC_LEVEL", EcLevel::parse)? {
            self.ec_level = level;
        }
        if let Some(size) = env_value(lookup, "PERMAQR_BOX_SIZE", |v| v.parse::<u32>().ok())? {
            self.box_size = size;
        }
        if let Some(border) = env_value(lookup, "PERMAQR_BORDER", |v| v.parse::<u32>().ok())? {
            self.border = border;
        }
        if let Some(fit) = env_value(lookup, "PERMAQR_FIT", parse_flag)? {
            self.fit = fit;
        }
        if let Some(color) = lookup("PERMAQR_FILL_COLOR") {
            self.fill_color = color;
        }
        if let Some(color) = lookup("PERMAQR_BACK_COLOR") {
            self.back_color = color;
        }
        Ok(())
    }

    /// Check ranges and colour syntax
    pub fn validate(&self) -> Result<()> {
        if !(MIN_VERSION..=MAX_VERSION).contains(&self.version) {
            return Err(Error::Config(format!(
                "version {} out of range {MIN_VERSION}..={MAX_VERSION}",
                self.version
            )));
        }
        if self.box_size == 0 {
            return Err(Error::Config("box_size must be greater than 0".to_string()));
        }
        parse_color(&self.fill_color)?;
        parse_color(&self.back_color)?;
        Ok(())
    }

    /// Build the encoder described by these options
    pub fn encoder(&self) -> Result<QrEncoder> {
        QrEncoder::new(self.version, self.ec_level, self.fit)
    }

    /// Build the renderer described by these options
    pub fn renderer(&self) -> Result<QrRenderer> {
        QrRenderer::new(
            self.box_size,
            self.border,
            parse_color(&self.fill_color)?,
            parse_color(&self.back_color)?,
        )
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `PERMAQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = lookup("PERMAQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(file) = lookup("PERMAQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(color) = env_value(lookup, "PERMAQR_LOG_COLOR", parse_flag)? {
            self.color = color;
        }
        if let Some(rotation) = env_value(lookup, "PERMAQR_LOG_ROTATION", LogRotation::parse)? {
            self.rotation = Some(rotation);
        }
        Ok(())
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

fn env_value<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| Error::Config(format!("Invalid value '{raw}' for {key}"))),
        None => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_permanent_qr() {
        let config = PermaqrConfig::default();
        assert_eq!(config.url, "https://sheffmsg.fun");
        assert_eq!(config.output, PathBuf::from("my_permanent_qr.png"));
        assert_eq!(config.qr.version, 2);
        assert_eq!(config.qr.ec_level, EcLevel::H);
        assert_eq!(config.qr.box_size, 10);
        assert_eq!(config.qr.border, 2);
        assert!(config.qr.fit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permaqr.toml");
        fs::write(
            &path,
            "url = \"https://example.com\"\nverify = true\n\n[qr]\nversion = 4\nec_level = \"q\"\nborder = 4\n",
        )
        .unwrap();

        let config = PermaqrConfig::from_file(&path).unwrap();
        assert_eq!(config.url, "https://example.com");
        assert!(config.verify);
        assert_eq!(config.qr.version, 4);
        assert_eq!(config.qr.ec_level, EcLevel::Q);
        assert_eq!(config.qr.border, 4);
        // Untouched fields keep their defaults
        assert_eq!(config.qr.box_size, 10);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permaqr.yaml");
        fs::write(&path, "output: out/qr.png\nqr:\n  fit: false\n  fill_color: \"#112233\"\n").unwrap();

        let config = PermaqrConfig::from_file(&path).unwrap();
        assert_eq!(config.output, PathBuf::from("out/qr.png"));
        assert!(!config.qr.fit);
        assert_eq!(config.qr.fill_color, "#112233");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permaqr.ini");
        fs::write(&path, "").unwrap();
        assert!(matches!(PermaqrConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PERMAQR_URL", "https://override.test"),
            ("PERMAQR_VERSION", "7"),
            ("PERMAQR_EC_LEVEL", "low"),
            ("PERMAQR_FIT", "off"),
            ("PERMAQR_LOG_ROTATION", "daily"),
        ]
        .into_iter()
        .collect();

        let mut config = PermaqrConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.url, "https://override.test");
        assert_eq!(config.qr.version, 7);
        assert_eq!(config.qr.ec_level, EcLevel::L);
        assert!(!config.qr.fit);
        assert_eq!(config.qr.border, 2);
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_unparsable_override_is_config_error() {
        for (key, value) in [
            ("PERMAQR_VERSION", "abc"),
            ("PERMAQR_EC_LEVEL", "x"),
            ("PERMAQR_BORDER", "-1"),
            ("PERMAQR_FIT", "maybe"),
            ("PERMAQR_LOG_ROTATION", "weekly"),
        ] {
            let mut config = PermaqrConfig::default();
            let result = config.apply_overrides(|k| (k == key).then(|| value.to_string()));
            match result {
                Err(Error::Config(message)) => assert!(message.contains(key), "{message}"),
                other => panic!("{key}={value}: expected config error, got {other:?}"),
            }
            assert_eq!(config.qr, QrOptions::default());
        }
    }

    #[test]
    fn test_load_records_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[qr]\nborder = 3\n").unwrap();

        let config = PermaqrConfig::from_file(&path).unwrap();
        assert_eq!(config.source, None);

        let loaded = PermaqrConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let mut qr = QrOptions {
            version: 41,
            ..QrOptions::default()
        };
        assert!(qr.validate().is_err());

        qr.version = 2;
        qr.box_size = 0;
        assert!(qr.validate().is_err());

        qr.box_size = 10;
        qr.back_color = "sort-of-white".to_string();
        assert!(qr.validate().is_err());

        let config = PermaqrConfig {
            url: String::new(),
            ..PermaqrConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
