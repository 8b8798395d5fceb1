//! Configuration file management

use anyhow::{Context, Result, anyhow};
use protocol::{BusAddress, PortPath, UsbId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapConfig {
    #[serde(default)]
    pub general: GeneralSettings,
    /// Default device filter
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
    /// Block device lookup for `--print`
    #[serde(default)]
    pub block_device: BlockDeviceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default = "GeneralSettings::default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl GeneralSettings {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

/// Filter values used when the command line does not give them
///
/// # Example Configuration
/// ```toml
/// [device]
/// id = "0bda:0316"
/// location = "2-1.3"
/// serial = "000000001"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Vendor and product ID (defaults to 0bda:0316)
    #[serde(default)]
    pub id: UsbId,
    /// Bus number and device address, "BUS-ADDR"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<BusAddress>,
    /// Topological path, "BUS-PORT[.PORT]..."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PortPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Always use the classic PORT_SUSPEND request
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Hub control request timeout
    #[serde(default = "TransferSettings::default_control_timeout_ms")]
    pub control_timeout_ms: u64,
    /// Kernel driver attach retries after the first attempt (timeouts only)
    #[serde(default = "TransferSettings::default_attach_retries")]
    pub attach_retries: u32,
    #[serde(default)]
    pub attach_retry_delay_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            control_timeout_ms: Self::default_control_timeout_ms(),
            attach_retries: Self::default_attach_retries(),
            attach_retry_delay_ms: 0,
        }
    }
}

impl TransferSettings {
    fn default_control_timeout_ms() -> u64 {
        5000
    }

    fn default_attach_retries() -> u32 {
        5
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn attach_retry_delay(&self) -> Duration {
        Duration::from_millis(self.attach_retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDeviceSettings {
    /// How long to wait for the disk to appear after switching to host
    #[serde(default = "BlockDeviceSettings::default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "BlockDeviceSettings::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for BlockDeviceSettings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: Self::default_wait_timeout_ms(),
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}

impl BlockDeviceSettings {
    fn default_wait_timeout_ms() -> u64 {
        10_000
    }

    fn default_poll_interval_ms() -> u64 {
        100
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SwapConfig {
    /// Load configuration from `path`, or from the first standard location that exists
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![Self::default_path(), PathBuf::from("/etc/sdswap/config.toml")];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

        tracing::debug!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SwapConfig = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the standard locations, falling back to defaults when none exists
    pub fn load_or_default() -> Result<Self> {
        let exists = Self::default_path().exists() || Path::new("/etc/sdswap/config.toml").exists();
        if exists {
            Self::load(None)
        } else {
            tracing::debug!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Per-user configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("sdswap").join("config.toml")
        } else {
            PathBuf::from(".config/sdswap/config.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_log_level(&self.general.log_level)?;

        if self.transfer.control_timeout_ms == 0 {
            return Err(anyhow!("transfer.control_timeout_ms must be greater than 0"));
        }
        if self.block_device.wait_timeout_ms == 0 {
            return Err(anyhow!("block_device.wait_timeout_ms must be greater than 0"));
        }
        if self.block_device.poll_interval_ms == 0 {
            return Err(anyhow!("block_device.poll_interval_ms must be greater than 0"));
        }
        if self.device.serial.as_deref() == Some("") {
            return Err(anyhow!("device.serial must not be empty"));
        }

        Ok(())
    }
}

/// Check a log level name
pub fn validate_log_level(level: &str) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
    if !valid_levels.contains(&level) {
        return Err(anyhow!(
            "Invalid log level '{}', must be one of: {}",
            level,
            valid_levels.join(", ")
        ));
    }
    Ok(())
}

/// Load the configuration named on the command line, or the standard one
pub fn load_config(path: Option<&str>) -> Result<SwapConfig> {
    match path {
        Some(path) => {
            let path_buf = PathBuf::from(shellexpand::tilde(path).as_ref());
            SwapConfig::load(Some(path_buf))
        }
        None => SwapConfig::load_or_default(),
    }
}
