//! Configuration file – reads/writes `~/.seeker/config.toml`.

use seeker_runtime::{BehaviorConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The simulated world the CLI drives the robot in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Reading of every thermal zone with no heat source.
    pub ambient: u8,
    /// Reading of the eight directional pixels when a source is present;
    /// `0` leaves the scene cold.
    pub heat_source: u8,
    /// Range-sensor distance to the source.
    pub heat_range: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ambient: 22,
            heat_source: 40,
            heat_range: 25.0,
        }
    }
}

/// Persisted configuration stored in `~/.seeker/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Activity periods.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Behavior thresholds.
    #[serde(default)]
    pub behavior: BehaviorConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Return the path to `~/.seeker/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".seeker").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `SEEKER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SEEKER_BEHAVIOR_MS` | `scheduler.behavior_period_ms` |
/// | `SEEKER_ODOMETRY_MS` | `scheduler.odometry_period_ms` |
/// | `SEEKER_DISPLAY_MS` | `scheduler.display_period_ms` |
/// | `SEEKER_REMOTE_MS` | `scheduler.remote_period_ms` |
/// | `SEEKER_PROXIMITY` | `behavior.proximity_threshold` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    let periods = [
        ("SEEKER_BEHAVIOR_MS", &mut cfg.scheduler.behavior_period_ms),
        ("SEEKER_ODOMETRY_MS", &mut cfg.scheduler.odometry_period_ms),
        ("SEEKER_DISPLAY_MS", &mut cfg.scheduler.display_period_ms),
        ("SEEKER_REMOTE_MS", &mut cfg.scheduler.remote_period_ms),
    ];
    for (var, field) in periods {
        if let Ok(v) = std::env::var(var)
            && let Ok(ms) = v.parse::<u64>()
        {
            *field = ms;
        }
    }
    if let Ok(v) = std::env::var("SEEKER_PROXIMITY")
        && let Ok(threshold) = v.parse::<f64>()
    {
        cfg.behavior.proximity_threshold = threshold;
    }
}

/// Save the config to disk, creating `~/.seeker/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.scheduler.behavior_period_ms, 250);
        assert_eq!(loaded.scheduler.remote_period_ms, 5500);
        assert_eq!(loaded.behavior.search_timeout, 24);
        assert_eq!(loaded.simulation.ambient, 22);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[behavior]\nsearch_timeout = 12\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.behavior.search_timeout, 12);
        assert_eq!(loaded.behavior.give_up_after, 20);
        assert_eq!(loaded.scheduler, SchedulerConfig::default());
        assert_eq!(loaded.simulation, SimulationConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn config_path_points_to_seeker_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".seeker"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // Every SEEKER_* env-var case lives in this one test.
    #[test]
    fn apply_env_overrides_reads_seeker_variables() {
        // SAFETY: no other test in this crate touches these variables.
        unsafe {
            std::env::set_var("SEEKER_BEHAVIOR_MS", "125");
            std::env::set_var("SEEKER_REMOTE_MS", "1000");
            std::env::set_var("SEEKER_ODOMETRY_MS", "not-a-number");
            std::env::set_var("SEEKER_PROXIMITY", "55.5");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.scheduler.behavior_period_ms, 125);
        assert_eq!(cfg.scheduler.remote_period_ms, 1000);
        assert_eq!(cfg.scheduler.odometry_period_ms, 100);
        assert_eq!(cfg.scheduler.display_period_ms, 500);
        assert_eq!(cfg.behavior.proximity_threshold, 55.5);
        unsafe {
            for var in [
                "SEEKER_BEHAVIOR_MS",
                "SEEKER_REMOTE_MS",
                "SEEKER_ODOMETRY_MS",
                "SEEKER_PROXIMITY",
            ] {
                std::env::remove_var(var);
            }
        }
    }
}
