use clap::Parser;
use knitting_shared::config::GameConfig;
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Rate of players_state broadcasts. Must divide the tick rate.
    pub broadcast_rate_hz: u32,
    pub rng_seed: u64,
    pub max_connections: usize,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            broadcast_rate_hz: 60,
            rng_seed: 42,
            max_connections: 256,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.game.validate()?;
        if self.broadcast_rate_hz == 0 || self.broadcast_rate_hz > self.game.tick_rate_hz {
            return Err("broadcast_rate_hz must be in 1..=tick_rate_hz".to_string());
        }
        if self.game.tick_rate_hz % self.broadcast_rate_hz != 0 {
            return Err("tick_rate_hz must be a multiple of broadcast_rate_hz".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        Ok(())
    }
}

/// Knitting arena server
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "KNITTING_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: String,

    /// Seed for spawn positions and team tie-breaks
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// JSON file with game tuning (camelCase keys, missing keys keep their defaults)
    #[arg(long, env = "KNITTING_CONFIG")]
    pub config: Option<PathBuf>,

    /// players_state broadcasts per second
    #[arg(long, default_value_t = 60)]
    pub broadcast_hz: u32,

    #[arg(long, default_value_t = 256)]
    pub max_connections: usize,
}

impl Cli {
    pub fn into_config(self) -> Result<ServerConfig, String> {
        let game = match &self.config {
            Some(path) => load_game_config(path)?,
            None => GameConfig::default(),
        };
        let config = ServerConfig {
            listen_addr: self.listen,
            broadcast_rate_hz: self.broadcast_hz,
            rng_seed: self.seed,
            max_connections: self.max_connections,
            game,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Read a game config from a JSON file.
pub fn load_game_config(path: &Path) -> Result<GameConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_game_config(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse_game_config(text: &str) -> Result<GameConfig, String> {
    let config: GameConfig = serde_json::from_str(text).map_err(|e| e.to_string())?;
    config.validate()?;
    Ok(config)
}
