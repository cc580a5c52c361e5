use configparser::ini::Ini;
use log::{LevelFilter, info, warn};
use once_cell::sync::Lazy;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

const CONFIG_PATH: &str = "railbeat.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub beatmap_path: String,
    /// Label of the chart block to play, matched against `<label>:` lines.
    pub difficulty: String,
    /// Seconds a node takes from spawning to the judgment line.
    pub arrival_time: f32,
    /// Snap the player back to the middle rail when no direction is held.
    pub default_reset: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub headless: bool,
    pub headless_seconds: f32,
    pub autoplay: bool,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beatmap_path: "assets/beatmaps/song.sm".to_string(),
            difficulty: "Easy".to_string(),
            arrival_time: 2.0,
            default_reset: true,
            window_width: 1280,
            window_height: 720,
            headless: false,
            headless_seconds: 30.0,
            autoplay: false,
            log_level: LogLevel::Info,
        }
    }
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn bool_str(v: bool) -> String {
    if v { "1" } else { "0" }.to_string()
}

fn to_ini(config: &Config) -> Ini {
    let mut conf = Ini::new();
    conf.set("Session", "BeatmapPath", Some(config.beatmap_path.clone()));
    conf.set("Session", "Difficulty", Some(config.difficulty.clone()));
    conf.set("Session", "ArrivalTime", Some(config.arrival_time.to_string()));
    conf.set("Player", "DefaultReset", Some(bool_str(config.default_reset)));
    conf.set("Window", "Width", Some(config.window_width.to_string()));
    conf.set("Window", "Height", Some(config.window_height.to_string()));
    conf.set("Run", "Headless", Some(bool_str(config.headless)));
    conf.set("Run", "HeadlessSeconds", Some(config.headless_seconds.to_string()));
    conf.set("Run", "Autoplay", Some(bool_str(config.autoplay)));
    conf.set("Debug", "LogLevel", Some(config.log_level.as_str().to_string()));
    conf
}

fn parsed<T: FromStr>(conf: &Ini, section: &str, key: &str, default: T) -> T {
    match conf.get(section, key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("Invalid value '{}' for [{}] {}; using default.", raw, section, key);
                default
            }
        },
        None => default,
    }
}

fn flag(conf: &Ini, section: &str, key: &str, default: bool) -> bool {
    parsed::<u8>(conf, section, key, u8::from(default)) != 0
}

/// Reads settings out of an already loaded INI, falling back per key.
pub fn from_ini(conf: &Ini) -> Config {
    let d = Config::default();
    let mut arrival_time = parsed(conf, "Session", "ArrivalTime", d.arrival_time);
    if !arrival_time.is_finite() || arrival_time <= 0.0 {
        warn!("ArrivalTime must be positive; using {}.", d.arrival_time);
        arrival_time = d.arrival_time;
    }
    Config {
        beatmap_path: conf.get("Session", "BeatmapPath").unwrap_or(d.beatmap_path),
        difficulty: conf.get("Session", "Difficulty").unwrap_or(d.difficulty),
        arrival_time,
        default_reset: flag(conf, "Player", "DefaultReset", d.default_reset),
        window_width: parsed(conf, "Window", "Width", d.window_width).max(1),
        window_height: parsed(conf, "Window", "Height", d.window_height).max(1),
        headless: flag(conf, "Run", "Headless", d.headless),
        headless_seconds: parsed(conf, "Run", "HeadlessSeconds", d.headless_seconds).max(0.0),
        autoplay: flag(conf, "Run", "Autoplay", d.autoplay),
        log_level: conf
            .get("Debug", "LogLevel")
            .and_then(|v| v.parse().ok())
            .unwrap_or(d.log_level),
    }
}

fn create_default_file() -> Result<(), std::io::Error> {
    info!("Config file not found, creating defaults in '{}'.", CONFIG_PATH);
    to_ini(&Config::default()).write(CONFIG_PATH)
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists() {
        if let Err(e) = create_default_file() {
            warn!("Failed to create default config: {}", e);
            return;
        }
    }

    let mut conf = Ini::new();
    let loaded = match conf.load(CONFIG_PATH) {
        Ok(_) => from_ini(&conf),
        Err(e) => {
            warn!("Failed to load '{}' ({}), using defaults.", CONFIG_PATH, e);
            Config::default()
        }
    };
    *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = loaded;
}

/// Returns a copy of the current configuration.
pub fn get() -> Config {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ini(text: &str) -> Ini {
        let mut conf = Ini::new();
        conf.read(text.to_string()).expect("valid ini");
        conf
    }

    #[test]
    fn reads_values_case_insensitively() {
        let conf = ini("[session]\nbeatmappath = charts/a.sm\nDifficulty = Hard\nArrivalTime = 1.5\n\
                        [Player]\nDefaultReset = 0\n[Debug]\nLogLevel = debug\n");
        let config = from_ini(&conf);
        assert_eq!(config.beatmap_path, "charts/a.sm");
        assert_eq!(config.difficulty, "Hard");
        assert_eq!(config.arrival_time, 1.5);
        assert!(!config.default_reset);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.window_width, 1280, "missing keys keep defaults");
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let conf = ini("[Session]\nArrivalTime = -3\n[Window]\nWidth = wide\n[Debug]\nLogLevel = loud\n");
        let config = from_ini(&conf);
        let d = Config::default();
        assert_eq!(config.arrival_time, d.arrival_time);
        assert_eq!(config.window_width, d.window_width);
        assert_eq!(config.log_level, d.log_level);
    }

    #[test]
    fn defaults_survive_an_ini_round_trip() {
        let written = to_ini(&Config::default());
        let config = from_ini(&written);
        let d = Config::default();
        assert_eq!(config.beatmap_path, d.beatmap_path);
        assert_eq!(config.difficulty, d.difficulty);
        assert_eq!(config.default_reset, d.default_reset);
        assert_eq!(config.headless_seconds, d.headless_seconds);
    }
}
