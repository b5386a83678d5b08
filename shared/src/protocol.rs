use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GameConfig;
use crate::team::Team;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "players_state")]
    PlayersState(PlayersStateMsg),
    #[serde(rename = "territory_update")]
    TerritoryUpdate(TerritoryUpdateMsg),
    #[serde(rename = "team_score")]
    TeamScore(TeamScoreMsg),
    #[serde(rename = "crafted")]
    Crafted(CraftedMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: u32,
    pub team: Team,
    pub config: GameConfig,
    /// Every cell currently owned by a team
    pub territory: Vec<CellWire>,
    pub team_score: TeamScoreMsg,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PlayersStateMsg {
    pub players: Vec<PlayerWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct TerritoryUpdateMsg {
    pub cells: Vec<CellWire>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct TeamScoreMsg {
    #[ts(type = "number")]
    pub red: u64,
    #[ts(type = "number")]
    pub blue: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CraftedMsg {
    pub player_id: u32,
    pub blueprint: String,
    pub product: String,
    #[ts(type = "number")]
    pub score: u64,
    pub cells_claimed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PlayerWire {
    pub id: u32,
    pub name: String,
    /// CSS hex color, e.g. "#ff6600"
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[ts(type = "number")]
    pub score: u64,
    pub team: Team,
}

/// One territory cell. `team` is null for a cell that has just been cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct CellWire {
    pub c: u32,
    pub r: u32,
    pub team: Option<Team>,
    pub level: u8,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "join")]
    Join { name: String, color: String },
    /// Desired direction on the floor. A zero vector releases the input.
    #[serde(rename = "move")]
    Move { dx: f64, dz: f64 },
}

// === Conversion helpers ===

/// Round to 2 decimal places (world units, sub-centimetre precision is never rendered)
#[inline]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
