//! CLI configuration – reads/writes `~/.refill/config.toml`.
//!
//! ```toml
//! [service]
//! camera_name = "sim_camera"
//! motor_name = "sim_motor"
//! vision_name = "sim_vision"
//! confidence_level = 0.55
//! auto_start = false
//!
//! [simulation]
//! label = "empty"
//! confidence = 0.8
//! capture_failure_every = 0
//! ```

use refill_runtime::ServiceAttributes;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Behaviour of the simulated devices the CLI wires up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Label the simulated classifier reports.
    #[serde(default = "default_label")]
    pub label: String,

    /// Confidence attached to that label.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Fail every n-th capture; `0` never fails.
    #[serde(default)]
    pub capture_failure_every: u64,
}

fn default_label() -> String {
    "empty".to_string()
}
fn default_confidence() -> f64 {
    0.8
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            confidence: default_confidence(),
            capture_failure_every: 0,
        }
    }
}

/// Persisted configuration stored in `~/.refill/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Attributes handed to the refill service.
    #[serde(default = "default_service")]
    pub service: ServiceAttributes,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Service attributes pointing at the simulated devices.
fn default_service() -> ServiceAttributes {
    ServiceAttributes {
        camera_name: Some("sim_camera".to_string()),
        motor_name: Some("sim_motor".to_string()),
        vision_name: Some("sim_vision".to_string()),
        ..Default::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: default_service(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Return the path to `~/.refill/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".refill").join("config.toml")
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `REFILL_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `REFILL_CONFIDENCE_LEVEL` | `service.confidence_level` |
/// | `REFILL_AUTO_START` | `service.auto_start` |
/// | `REFILL_PACING_DELAY_SECS` | `service.pacing_delay_secs` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("REFILL_CONFIDENCE_LEVEL")
        && let Ok(level) = v.parse::<f64>()
    {
        cfg.service.confidence_level = Some(level);
    }
    if let Ok(v) = std::env::var("REFILL_AUTO_START")
        && let Ok(auto_start) = v.parse::<bool>()
    {
        cfg.service.auto_start = Some(auto_start);
    }
    if let Ok(v) = std::env::var("REFILL_PACING_DELAY_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.service.pacing_delay_secs = Some(secs);
    }
}

/// Save the config to `path`, creating the parent directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

/// First-run setup: write the defaults to `path` and return them with the
/// `REFILL_*` overrides applied, as [`load_from`] does on later runs.  The
/// file itself keeps the plain defaults.
pub fn init_at(path: &Path) -> Result<Config, String> {
    let mut cfg = Config::default();
    save_to(&cfg, path)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}
