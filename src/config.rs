/// Tunables, loaded from TOML.  Every field has a default so a partial file
/// (or none at all) is fine.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Playfield;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig { width: 800, height: 600, fps: 60 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub lives: u32,
    pub speed: f32,
    /// Ticks between shots.
    pub shoot_cooldown: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig { lives: 3, speed: 5.0, shoot_cooldown: 5 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    pub rows: usize,
    pub cols: usize,
    pub base_speed: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfig { rows: 5, cols: 10, base_speed: 1.0 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BarrierConfig {
    pub count: usize,
    pub cell_size: i32,
    pub cols: usize,
    pub rows: usize,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        BarrierConfig { count: 4, cell_size: 6, cols: 15, rows: 10 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub screen: ScreenConfig,
    pub player: PlayerConfig,
    pub swarm: SwarmConfig,
    pub barriers: BarrierConfig,
    pub assets_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            screen: ScreenConfig::default(),
            player: PlayerConfig::default(),
            swarm: SwarmConfig::default(),
            barriers: BarrierConfig::default(),
            assets_dir: PathBuf::from("assets"),
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/space_invaders/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("space_invaders").join("config.toml"))
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given (errors are fatal); otherwise the default
    /// path when it exists, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        match Config::default_path() {
            Some(path) if path.exists() => Config::load(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.screen;
        if s.width == 0 || s.height == 0 {
            return Err(ConfigError::Invalid("screen size must be non-zero".into()));
        }
        if s.fps == 0 {
            return Err(ConfigError::Invalid("fps must be positive".into()));
        }
        let p = &self.player;
        if p.lives == 0 {
            return Err(ConfigError::Invalid("player needs at least one life".into()));
        }
        if !p.speed.is_finite() || p.speed < 0.0 {
            return Err(ConfigError::Invalid(
                "player speed must be a finite, non-negative number".into(),
            ));
        }
        let w = &self.swarm;
        if !w.base_speed.is_finite() || w.base_speed < 0.0 {
            return Err(ConfigError::Invalid(
                "swarm base speed must be a finite, non-negative number".into(),
            ));
        }
        if w.rows == 0 || w.cols == 0 {
            return Err(ConfigError::Invalid("swarm needs at least one invader".into()));
        }
        let b = &self.barriers;
        if b.count > 0 && (b.cell_size <= 0 || b.cols == 0 || b.rows == 0) {
            return Err(ConfigError::Invalid(
                "barrier cell size and grid dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn playfield(&self) -> Playfield {
        Playfield::new(self.screen.width as f32, self.screen.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_classic_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.playfield(), Playfield::new(800.0, 600.0));
        assert_eq!(cfg.swarm.rows * cfg.swarm.cols, 50);
        assert_eq!(cfg.player.lives, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [player]
            lives = 5

            [barriers]
            count = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.player.lives, 5);
        assert_eq!(cfg.player.speed, 5.0);
        assert_eq!(cfg.barriers.count, 2);
        assert_eq!(cfg.barriers.cell_size, 6);
        assert_eq!(cfg.screen, ScreenConfig::default());
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut cfg = Config::default();
        cfg.screen.fps = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_finite_speeds_are_rejected() {
        let cfg: Config = toml::from_str("[player]\nspeed = nan\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let cfg: Config = toml::from_str("[player]\nspeed = inf\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let cfg: Config = toml::from_str("[swarm]\nbase_speed = nan\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let cfg: Config = toml::from_str("[swarm]\nbase_speed = -inf\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_swarm_speed_is_rejected() {
        let mut cfg = Config::default();
        cfg.swarm.base_speed = -1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_lives_is_rejected() {
        let mut cfg = Config::default();
        cfg.player.lives = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_rejects_nan_speed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[player]\nspeed = nan").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[screen]\nwidth = \"wide\"").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::resolve(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
