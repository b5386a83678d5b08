//! Wire protocol re-exports plus conversions between simulation types and wire types.
//! Inbound payloads are validated here before they reach the game loop.

pub use knitting_shared::protocol::*;

use crate::craft::CraftEvent;
use crate::player::{css_color, Player, PLAYER_HEIGHT};
use crate::territory::{CellChange, TeamScore};

/// Longest accepted display name, in characters
pub const MAX_NAME_CHARS: usize = 24;

/// A join request that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinRequest {
    /// None when the client sent nothing usable
    pub name: Option<String>,
    /// None when the client color was not "#rrggbb"
    pub color: Option<u32>,
}

impl JoinRequest {
    pub fn new(raw_name: &str, raw_color: &str) -> Self {
        Self {
            name: sanitize_name(raw_name),
            color: parse_css_color(raw_color),
        }
    }
}

/// Inbound events after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Join(JoinRequest),
    Move { dx: f64, dz: f64 },
}

/// Parse and validate one text frame. Returns None for anything malformed.
pub fn parse_client_msg(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str::<ClientMsg>(text).ok()? {
        ClientMsg::Join { name, color } => Some(ClientEvent::Join(JoinRequest::new(&name, &color))),
        ClientMsg::Move { dx, dz } if dx.is_finite() && dz.is_finite() => {
            Some(ClientEvent::Move { dx, dz })
        }
        ClientMsg::Move { .. } => None,
    }
}

/// Trim, drop control characters and cap the length. Empty results are rejected.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect();
    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Parse "#rrggbb" (case-insensitive).
pub fn parse_css_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

impl From<&Player> for PlayerWire {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            color: css_color(player.color),
            x: round2(player.position.x),
            y: PLAYER_HEIGHT,
            z: round2(player.position.z),
            score: player.score,
            team: player.team,
        }
    }
}

impl From<&CellChange> for CellWire {
    fn from(change: &CellChange) -> Self {
        Self {
            c: change.col as u32,
            r: change.row as u32,
            team: change.cell.team,
            level: change.cell.level,
        }
    }
}

impl From<TeamScore> for TeamScoreMsg {
    fn from(score: TeamScore) -> Self {
        Self {
            red: score.red,
            blue: score.blue,
        }
    }
}

impl From<&CraftEvent> for CraftedMsg {
    fn from(event: &CraftEvent) -> Self {
        Self {
            player_id: event.player_id,
            blueprint: event.blueprint.to_string(),
            product: event.product.to_string(),
            score: event.score,
            cells_claimed: event.cells_covered as u32,
        }
    }
}

/// Wire form of a batch of cell changes.
pub fn territory_update(changes: &[CellChange]) -> TerritoryUpdateMsg {
    TerritoryUpdateMsg {
        cells: changes.iter().map(CellWire::from).collect(),
    }
}
