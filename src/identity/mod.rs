//! Device identity source.
//!
//! The Bkk320 main configuration file is a JSON document holding the device
//! serial number under the `SerNumb` key. The file belongs to the device
//! provisioning system and can change (or vanish) at any time, so the serial
//! is read fresh on every query and never cached.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::error;

use crate::error::{Error, Result};

/// Key holding the serial number in the main configuration file.
const SERIAL_NUMBER_KEY: &str = "SerNumb";

/// Sentinel serial number reported when the identity file is unreadable.
pub const SERIAL_UNKNOWN: u16 = 0;

/// Read-only view of the device identity configuration.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    main_cfg_path: PathBuf,
}

impl DeviceInfo {
    /// Create an identity source backed by the given main configuration file.
    pub fn new(main_cfg_path: impl Into<PathBuf>) -> Self {
        Self {
            main_cfg_path: main_cfg_path.into(),
        }
    }

    /// Path of the backing configuration file.
    pub fn main_cfg_path(&self) -> &Path {
        &self.main_cfg_path
    }

    /// Get the device serial number, or [`SERIAL_UNKNOWN`] if unavailable.
    ///
    /// Identity is best-effort: failures are logged and mapped to the
    /// sentinel so a response can still be produced. This call never errors
    /// across the handler boundary.
    pub fn serial_number(&self) -> u16 {
        match self.read_serial() {
            Ok(serial) => serial,
            Err(e) => {
                error!("Failed to read serial number: {}", e);
                SERIAL_UNKNOWN
            }
        }
    }

    fn read_serial(&self) -> Result<u16> {
        let content = fs::read_to_string(&self.main_cfg_path).map_err(|e| {
            Error::Identity(format!(
                "failed to open {}: {e}",
                self.main_cfg_path.display()
            ))
        })?;

        let doc: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| Error::Identity(format!("malformed main config: {e}")))?;

        let serial = doc
            .get(SERIAL_NUMBER_KEY)
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                Error::Identity(format!("missing or non-numeric {SERIAL_NUMBER_KEY}"))
            })?;

        u16::try_from(serial)
            .map_err(|_| Error::Identity(format!("{SERIAL_NUMBER_KEY} out of range: {serial}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_cfg(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_serial_number_read() {
        let cfg = write_cfg(r#"{"SerNumb": 4660, "Name": "Bkk320"}"#);
        let info = DeviceInfo::new(cfg.path());
        assert_eq!(info.serial_number(), 4660);
    }

    #[test]
    fn test_missing_file_returns_sentinel() {
        let info = DeviceInfo::new("/nonexistent/MainCfg.json");
        assert_eq!(info.serial_number(), SERIAL_UNKNOWN);
    }

    #[test]
    fn test_malformed_json_returns_sentinel() {
        let cfg = write_cfg("{not json");
        let info = DeviceInfo::new(cfg.path());
        assert_eq!(info.serial_number(), SERIAL_UNKNOWN);
    }

    #[test]
    fn test_missing_key_returns_sentinel() {
        let cfg = write_cfg(r#"{"Name": "Bkk320"}"#);
        let info = DeviceInfo::new(cfg.path());
        assert_eq!(info.serial_number(), SERIAL_UNKNOWN);
    }

    #[test]
    fn test_out_of_range_serial_returns_sentinel() {
        let cfg = write_cfg(r#"{"SerNumb": 70000}"#);
        let info = DeviceInfo::new(cfg.path());
        assert_eq!(info.serial_number(), SERIAL_UNKNOWN);
    }

    #[test]
    fn test_fresh_read_sees_updates() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"SerNumb": 1}"#).unwrap();
        let info = DeviceInfo::new(file.path());
        assert_eq!(info.serial_number(), 1);

        // Rewrite the file; the next query must see the new value.
        let mut handle = std::fs::File::create(file.path()).unwrap();
        handle.write_all(br#"{"SerNumb": 2}"#).unwrap();
        assert_eq!(info.serial_number(), 2);
    }
}
