//! Static catalog of reference shapes a loop can be crafted into.

use crate::geometry::{aligned_distance, circle_points, normalize, resample};
use crate::vec2::{self, vec2, Vec2};
use knitting_shared::config::GameConfig;
use std::f64::consts::TAU;

/// A named reference shape.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub name: &'static str,
    /// What a successful craft of this shape produces
    pub product: &'static str,
    pub base_score: u32,
    /// Defining vertices as a player would draw them, centered on the origin
    pub outline: Vec<Vec2>,
    /// `outline` resampled and normalized, the form loops are compared against
    pub reference: Vec<Vec2>,
}

impl Blueprint {
    fn new(
        name: &'static str,
        product: &'static str,
        base_score: u32,
        unit_outline: Vec<Vec2>,
        resample_points: usize,
        drawing_radius: f64,
    ) -> Self {
        let outline: Vec<Vec2> = unit_outline
            .into_iter()
            .map(|p| vec2::scale(p, drawing_radius))
            .collect();
        let reference = normalize(&resample(&outline, resample_points));
        Self {
            name,
            product,
            base_score,
            outline,
            reference,
        }
    }
}

/// Regular polygon with `sides` corners on the unit circle, first corner at `phase` radians.
fn regular_polygon(sides: usize, phase: f64) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let a = phase + TAU * i as f64 / sides as f64;
            vec2(a.cos(), a.sin())
        })
        .collect()
}

/// Five-pointed star alternating outer and inner radius.
fn star_outline(inner: f64) -> Vec<Vec2> {
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { 1.0 } else { inner };
            let a = TAU * i as f64 / 10.0 - TAU / 4.0;
            vec2(r * a.cos(), r * a.sin())
        })
        .collect()
}

/// The shapes known to the server. Built once at startup.
///
/// Outlines are kept at world scale (`drawing_radius`) so they go through the same
/// simplify/resample/normalize pipeline as a drawn loop with the same `rdp_epsilon`.
#[derive(Debug, Clone)]
pub struct BlueprintCatalog {
    blueprints: Vec<Blueprint>,
}

impl BlueprintCatalog {
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.resample_points as usize, config.size_reference)
    }

    pub fn new(resample_points: usize, drawing_radius: f64) -> Self {
        let blueprints = vec![
            Blueprint::new(
                "circle",
                "Beanie",
                10,
                circle_points(Vec2::ZERO, 1.0, 64),
                resample_points,
                drawing_radius,
            ),
            Blueprint::new(
                "square",
                "Blanket",
                12,
                regular_polygon(4, TAU / 8.0),
                resample_points,
                drawing_radius,
            ),
            Blueprint::new(
                "triangle",
                "Shawl",
                15,
                regular_polygon(3, -TAU / 4.0),
                resample_points,
                drawing_radius,
            ),
            Blueprint::new(
                "star",
                "Ornament",
                25,
                star_outline(0.45),
                resample_points,
                drawing_radius,
            ),
        ];
        Self { blueprints }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Blueprint> {
        self.blueprints.iter().find(|b| b.name == name)
    }

    /// Closest blueprint to a normalized, resampled outline, with its distance.
    pub fn best_match(&self, candidate: &[Vec2]) -> Option<(&Blueprint, f64)> {
        self.blueprints
            .iter()
            .map(|b| (b, aligned_distance(candidate, &b.reference)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
