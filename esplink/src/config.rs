//! Front-end configuration.

use std::path::Path;

use esplink_core::{
    CompressionBudget, LinkConfig, LinkError, PREVIEW_MAX_SIDE, SerialConfig, SessionConfig,
    UploadPacing, check_chunk_size,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial port settings.
    pub serial: SerialConfig,
    /// Upload timing.
    pub upload: UploadPacing,
    /// Compression budget.
    pub compression: CompressionBudget,
    /// Preview settings.
    pub preview: PreviewConfig,
    /// Session settings.
    pub session: SessionConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Longest side of the preview thumbnail.
    pub max_side: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is not set.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_side: PREVIEW_MAX_SIDE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl AppConfig {
    /// Read a TOML file without logging. `Ok(None)` when it does not
    /// exist.
    pub fn read(path: &Path) -> Result<Option<Self>, LinkError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LinkError::Config(format!("{}: {e}", path.display()))),
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|e| LinkError::Config(format!("{}: {e}", path.display())))
    }

    /// Settle the outcome of [`AppConfig::read`], falling back to
    /// defaults. Call once logging is up so the warning is seen.
    pub fn resolve(read: Result<Option<Self>, LinkError>, path: &Path) -> Self {
        match read {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Log level to start with, before the file is fully resolved.
    pub fn initial_log_level(read: &Result<Option<Self>, LinkError>) -> String {
        match read {
            Ok(Some(config)) => config.logging.level.clone(),
            _ => LoggingConfig::default().level,
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Settings for the link session.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            serial: self.serial.clone(),
            upload: self.upload,
            session: self.session.clone(),
        }
    }

    /// Reject values the core cannot run with.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.serial.port.is_empty() {
            return Err(LinkError::Config(
                "no serial port configured (use --port)".into(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(LinkError::Config("baud_rate must be non-zero".into()));
        }
        check_chunk_size(self.upload.chunk_size)?;
        if self.upload.progress_interval == 0 {
            return Err(LinkError::Config(
                "upload.progress_interval must be non-zero".into(),
            ));
        }
        self.compression
            .validate()
            .map_err(|e| LinkError::Config(e.to_string()))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(text.contains("baud_rate"));
        assert!(text.contains("settle_delay_ms"));
        assert!(text.contains("max_bytes"));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.serial.baud_rate, 115_200);
        assert_eq!(parsed.compression.max_bytes, 19 * 1024);
        assert_eq!(parsed.preview.max_side, 300);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"

            [upload]
            pacing_delay_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(parsed.serial.port, "/dev/ttyUSB0");
        assert_eq!(parsed.serial.baud_rate, 115_200);
        assert_eq!(parsed.upload.pacing_delay_ms, 20);
        assert_eq!(parsed.upload.settle_delay_ms, 500);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn read_distinguishes_missing_from_malformed() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.toml");
        assert!(matches!(AppConfig::read(&missing), Ok(None)));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[serial\nport = ").unwrap();
        let read = AppConfig::read(&broken);
        assert!(matches!(read, Err(LinkError::Config(ref m)) if m.contains("broken.toml")));
        assert_eq!(AppConfig::initial_log_level(&read), "warn");
        assert_eq!(AppConfig::resolve(read, &broken).serial.baud_rate, 115_200);

        let good = dir.path().join("esplink.toml");
        std::fs::write(&good, "[logging]\nlevel = \"debug\"\n").unwrap();
        let read = AppConfig::read(&good);
        assert_eq!(AppConfig::initial_log_level(&read), "debug");
        assert_eq!(AppConfig::resolve(read, &good).logging.level, "debug");
    }

    #[test]
    fn missing_port_is_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("--port"));
    }

    #[test]
    fn bad_budget_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.serial.port = "COM3".into();
        cfg.compression.quality_step = 0;
        assert!(matches!(cfg.validate(), Err(LinkError::Config(_))));
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.serial.port = "COM3".into();

        cfg.upload.chunk_size = 4096;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, LinkError::Config(ref m) if m.contains("chunk size")));

        cfg.upload.chunk_size = 0;
        assert!(matches!(cfg.validate(), Err(LinkError::Config(_))));

        cfg.upload.chunk_size = 64;
        assert!(cfg.validate().is_ok());
    }
}
