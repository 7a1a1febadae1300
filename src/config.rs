use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WORKERS: usize = 20;

/// Upper bounds for every memoized lookup kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheCapacities {
    pub list: usize,
    pub roster: usize,
    pub pokemon: usize,
    pub species: usize,
    pub ability: usize,
    pub moves: usize,
    pub evolution: usize,
    pub varieties: usize,
    pub static_data: usize,
    pub translation: usize,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self {
            list: 1500,
            roster: 600,
            pokemon: 1000,
            species: 800,
            ability: 800,
            moves: 1000,
            evolution: 800,
            varieties: 800,
            static_data: 1,
            translation: 512,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub request_timeout: Duration,
    pub workers: usize,
    /// Language code tried first for flavor text and genus.
    pub species_language: String,
    pub translate_source: String,
    pub translate_target: String,
    pub db_path: PathBuf,
    pub sprites_dir: PathBuf,
    pub z_moves_path: PathBuf,
    pub capacities: CacheCapacities,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            workers: DEFAULT_WORKERS,
            species_language: "pt-BR".to_string(),
            translate_source: "en".to_string(),
            translate_target: "pt".to_string(),
            db_path: data_dir.join("pokemons.db"),
            sprites_dir: data_dir.join("sprites"),
            z_moves_path: data_dir.join("zmoves.json"),
            capacities: CacheCapacities::default(),
        }
    }
}

impl Config {
    /// Apply `POKEDEX_*` environment variables on top of the current values.
    /// Unparseable numbers keep the existing value.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup("POKEDEX_API_BASE") {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("POKEDEX_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(workers) = lookup("POKEDEX_WORKERS").and_then(|v| v.parse().ok()) {
            self.workers = workers;
        }
        if let Some(lang) = lookup("POKEDEX_LANGUAGE") {
            self.species_language = lang;
        }
        if let Some(path) = lookup("POKEDEX_DB") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("POKEDEX_SPRITES_DIR") {
            self.sprites_dir = PathBuf::from(path);
        }
        if let Some(path) = lookup("POKEDEX_ZMOVES") {
            self.z_moves_path = PathBuf::from(path);
        }
        self
    }
}

fn data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pokedex-cache")
}
