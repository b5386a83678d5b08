//! Turns closed trail loops into crafted products, score and territory.

use crate::blueprint::{Blueprint, BlueprintCatalog};
use crate::geometry::{cells_covered, normalize, perimeter, resample, signed_area, simplify};
use crate::player::Player;
use crate::team::Team;
use crate::territory::{CellChange, TerritoryGrid};
use crate::vec2::Vec2;
use knitting_shared::config::GameConfig;
use std::fmt;

/// Why a loop did not produce a craft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CraftRejection {
    /// Simplified outline under the minimum area or perimeter
    TooSmall { area: f64, perimeter: f64 },
    /// No blueprint within the match threshold
    NoMatch { best_distance: f64 },
}

impl fmt::Display for CraftRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CraftRejection::TooSmall { area, perimeter } => {
                write!(f, "loop too small (area {:.0}, perimeter {:.0})", area, perimeter)
            }
            CraftRejection::NoMatch { best_distance } => {
                write!(f, "no blueprint matched (best distance {:.3})", best_distance)
            }
        }
    }
}

/// A loop recognised as a blueprint.
#[derive(Debug, Clone)]
pub struct ShapeMatch<'a> {
    pub blueprint: &'a Blueprint,
    pub distance: f64,
    pub area: f64,
    pub score: u64,
    /// Simplified outline in world coordinates
    pub outline: Vec<Vec2>,
}

/// A completed craft.
#[derive(Debug, Clone)]
pub struct CraftEvent {
    pub player_id: u32,
    pub team: Team,
    pub blueprint: &'static str,
    pub product: &'static str,
    pub score: u64,
    /// Cells whose centers fall inside the crafted outline
    pub cells_covered: usize,
    /// Cells whose state the claim changed
    pub changes: Vec<CellChange>,
}

/// Score for a match: bigger shapes and closer matches score more.
pub fn craft_score(base_score: u32, area: f64, distance: f64, config: &GameConfig) -> u64 {
    let size_multiplier = area.sqrt() / config.size_reference;
    let style_multiplier = config
        .style_cap
        .min(1.0 / (distance + config.style_offset));
    let score = (base_score as f64 * size_multiplier * style_multiplier).round();
    if score.is_finite() && score > 0.0 {
        score as u64
    } else {
        0
    }
}

/// Recognise a closed loop without touching any state.
pub fn recognize<'a>(
    loop_points: &[Vec2],
    config: &GameConfig,
    catalog: &'a BlueprintCatalog,
) -> Result<ShapeMatch<'a>, CraftRejection> {
    let outline = simplify(loop_points, config.rdp_epsilon);
    let area = signed_area(&outline).abs();
    let perimeter = perimeter(&outline);
    if area < config.min_craft_area || perimeter < config.min_craft_perimeter {
        return Err(CraftRejection::TooSmall { area, perimeter });
    }

    let candidate = normalize(&resample(&outline, config.resample_points as usize));
    let Some((blueprint, distance)) = catalog.best_match(&candidate) else {
        return Err(CraftRejection::NoMatch {
            best_distance: f64::INFINITY,
        });
    };
    if distance >= config.match_threshold {
        return Err(CraftRejection::NoMatch {
            best_distance: distance,
        });
    }

    Ok(ShapeMatch {
        blueprint,
        distance,
        area,
        score: craft_score(blueprint.base_score, area, distance, config),
        outline,
    })
}

/// Resolve a loop closed by `player`: on a match, credit the score, claim the enclosed cells
/// for the player's team at craft strength and clear the trail. A rejected loop leaves the
/// player, trail and grid untouched.
pub fn resolve(
    player: &mut Player,
    loop_points: &[Vec2],
    config: &GameConfig,
    catalog: &BlueprintCatalog,
    territory: &mut TerritoryGrid,
) -> Result<CraftEvent, CraftRejection> {
    let shape = recognize(loop_points, config, catalog)?;

    player.score = player.score.saturating_add(shape.score);
    let cells = cells_covered(&shape.outline, territory.layout());
    let changes = territory.claim_cells(&cells, player.team, config.craft_claim_strength);
    player.trail.clear();

    Ok(CraftEvent {
        player_id: player.id,
        team: player.team,
        blueprint: shape.blueprint.name,
        product: shape.blueprint.product,
        score: shape.score,
        cells_covered: cells.len(),
        changes,
    })
}
