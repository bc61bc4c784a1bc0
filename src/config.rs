// config.rs — application configuration
//
// Sources, later ones win:
// - built-in defaults
// - JSON file: --config <path>, else $LUNAR_VIEWER_CONFIG, else ./lunar_viewer.json if present
// - Env: LUNAR_LANG
// - CLI: --moon-texture <path> --stars-texture <path> --no-stars --resolution <n> --lang <code>

use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "lunar_viewer.json";

/// Textured Moon viewer with an orbit overlay.
#[derive(Parser, Debug, Default, Clone, PartialEq)]
#[command(name = "lunar_viewer", version, about)]
pub struct Cli {
    /// JSON config file (overrides $LUNAR_VIEWER_CONFIG).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Moon texture image.
    #[arg(long)]
    pub moon_texture: Option<PathBuf>,

    /// Star backdrop texture image.
    #[arg(long)]
    pub stars_texture: Option<PathBuf>,

    /// Do not draw the star backdrop.
    #[arg(long)]
    pub no_stars: bool,

    /// Theta and phi resolution of the spheres (at least 3).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(3..))]
    pub resolution: Option<usize>,

    /// UI language code, e.g. en or zh-Hans.
    #[arg(long)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Metres.
    pub moon_radius: f32,
    /// Theta and phi resolution of both spheres.
    pub resolution: usize,
    pub moon_texture: PathBuf,
    pub stars_texture: PathBuf,
    pub show_stars: bool,
    /// Star sphere radius as a multiple of the Moon radius.
    pub star_radius_scale: f32,
    pub show_orbit: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            moon_radius: 1_737_400.0,
            resolution: 120,
            moon_texture: PathBuf::from("8k_moon.jpg"),
            stars_texture: PathBuf::from("8k_stars.jpg"),
            show_stars: true,
            star_radius_scale: 100.0,
            show_orbit: true,
        }
    }
}

impl SceneConfig {
    pub fn star_radius(&self) -> f32 {
        self.moon_radius * self.star_radius_scale
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub lang: String,
    pub scene: SceneConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            scene: SceneConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the process environment. Bad flags
    /// make clap print usage and exit.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        let env_path = std::env::var("LUNAR_VIEWER_CONFIG").ok().filter(|v| !v.trim().is_empty());
        let env_lang = std::env::var("LUNAR_LANG").ok().filter(|v| !v.trim().is_empty());
        Self::resolve(&cli, env_path.map(PathBuf::from), env_lang)
    }

    pub fn resolve(
        cli: &Cli,
        env_path: Option<PathBuf>,
        env_lang: Option<String>,
    ) -> Result<Self, ConfigError> {
        let explicit = cli.config.clone().or(env_path);

        let mut cfg = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::info!("no config file, using defaults");
                Self::default()
            }
        };

        if let Some(lang) = env_lang {
            cfg.lang = lang;
        }
        cfg.apply_cli(cli);
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {:?}", path);
        Ok(cfg)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.moon_texture {
            self.scene.moon_texture = path.clone();
        }
        if let Some(path) = &cli.stars_texture {
            self.scene.stars_texture = path.clone();
        }
        if cli.no_stars {
            self.scene.show_stars = false;
        }
        if let Some(n) = cli.resolution {
            self.scene.resolution = n;
        }
        if let Some(lang) = &cli.lang {
            self.lang = lang.clone();
        }
    }
}
