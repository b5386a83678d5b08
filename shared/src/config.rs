/// Largest territory grid (cols × rows) a config may ask for
pub const MAX_GRID_CELLS: usize = 250_000;
/// Largest trail buffer per player
pub const MAX_TRAIL_LEN: u32 = 4096;
pub const MAX_RESAMPLE_POINTS: u32 = 1024;

/// Tunable simulation parameters.
///
/// Distances are world units on the X/Z floor, velocities are world units per tick.
/// Sent to clients in the welcome message so they can size the arena and grid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub arena_width: f64,
    pub arena_height: f64,
    /// Edge length of one territory cell
    pub cell_size: f64,
    pub tick_rate_hz: u32,

    /// Velocity gained per second of held input (world units per tick, per second)
    pub accel_per_second: f64,
    /// Velocity multiplier applied every tick
    pub friction: f64,
    /// Maximum speed (world units per tick)
    pub max_speed: f64,
    /// Fraction of speed kept when bouncing off a wall
    pub wall_bounce: f64,
    /// Distance from the walls inside which players never spawn
    pub spawn_margin: f64,
    /// Input vectors at or below this length count as "no input"
    pub input_deadzone: f64,

    /// Ticks between two trail samples
    pub trail_sample_stride: u32,
    pub trail_max_len: u32,
    /// Head must come this close to an older sample to close a loop
    pub closure_radius: f64,
    /// Minimum sample distance between the head and the closing sample
    pub min_loop_gap: u32,

    pub rdp_epsilon: f64,
    pub resample_points: u32,
    pub min_craft_area: f64,
    pub min_craft_perimeter: f64,
    /// Largest average point distance still accepted as a blueprint match
    pub match_threshold: f64,
    /// sqrt(area) that yields a size multiplier of 1
    pub size_reference: f64,
    pub style_cap: f64,
    pub style_offset: f64,

    pub craft_claim_strength: u8,
    /// Strength of the per-sample claim on the cell under a player. 0 disables it.
    pub passive_claim_strength: u8,

    pub score_rate_hz: u32,
    /// Team score gained per owned cell on every score tick
    #[ts(type = "number")]
    pub score_per_cell: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena_width: 2400.0,
            arena_height: 1600.0,
            cell_size: 60.0,
            tick_rate_hz: 60,

            accel_per_second: 30.0,
            friction: 0.92,
            max_speed: 6.0,
            wall_bounce: 0.5,
            spawn_margin: 100.0,
            input_deadzone: 0.1,

            trail_sample_stride: 3,
            trail_max_len: 240,
            closure_radius: 20.0,
            min_loop_gap: 12,

            rdp_epsilon: 6.0,
            resample_points: 64,
            min_craft_area: 2500.0,
            min_craft_perimeter: 150.0,
            match_threshold: 0.2,
            size_reference: 100.0,
            style_cap: 3.0,
            style_offset: 0.1,

            craft_claim_strength: 3,
            passive_claim_strength: 1,

            score_rate_hz: 1,
            score_per_cell: 1,
        }
    }
}

impl GameConfig {
    /// Number of grid columns (floor(width / cell size))
    pub fn cols(&self) -> usize {
        (self.arena_width / self.cell_size).floor() as usize
    }

    /// Number of grid rows (floor(height / cell size))
    pub fn rows(&self) -> usize {
        (self.arena_height / self.cell_size).floor() as usize
    }

    pub fn half_width(&self) -> f64 {
        self.arena_width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.arena_height / 2.0
    }

    /// Acceleration applied per tick while input is held
    pub fn accel_per_tick(&self) -> f64 {
        self.accel_per_second / self.tick_rate_hz as f64
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("arena_width", self.arena_width),
            ("arena_height", self.arena_height),
            ("cell_size", self.cell_size),
            ("accel_per_second", self.accel_per_second),
            ("max_speed", self.max_speed),
            ("closure_radius", self.closure_radius),
            ("rdp_epsilon", self.rdp_epsilon),
            ("match_threshold", self.match_threshold),
            ("size_reference", self.size_reference),
            ("style_cap", self.style_cap),
            ("style_offset", self.style_offset),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be finite and > 0", name));
            }
        }
        let non_negative = [
            ("spawn_margin", self.spawn_margin),
            ("input_deadzone", self.input_deadzone),
            ("min_craft_area", self.min_craft_area),
            ("min_craft_perimeter", self.min_craft_perimeter),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be finite and >= 0", name));
            }
        }
        if !self.friction.is_finite() || self.friction <= 0.0 || self.friction >= 1.0 {
            return Err("friction must be in (0, 1)".to_string());
        }
        if !self.wall_bounce.is_finite() || !(0.0..=1.0).contains(&self.wall_bounce) {
            return Err("wall_bounce must be in [0, 1]".to_string());
        }
        let cells = (self.arena_width / self.cell_size).floor()
            * (self.arena_height / self.cell_size).floor();
        if cells > MAX_GRID_CELLS as f64 {
            return Err(format!(
                "cell_size gives {} cells, at most {} allowed",
                cells, MAX_GRID_CELLS
            ));
        }
        if self.cols() == 0 || self.rows() == 0 {
            return Err("cell_size must fit at least once into the arena".to_string());
        }
        if self.spawn_margin * 2.0 >= self.arena_width.min(self.arena_height) {
            return Err("spawn_margin leaves no room to spawn".to_string());
        }
        if self.tick_rate_hz == 0 || self.score_rate_hz == 0 {
            return Err("tick_rate_hz and score_rate_hz must be > 0".to_string());
        }
        if self.trail_sample_stride == 0 {
            return Err("trail_sample_stride must be > 0".to_string());
        }
        if self.min_loop_gap < 2 {
            return Err("min_loop_gap must be >= 2".to_string());
        }
        if self.trail_max_len <= self.min_loop_gap {
            return Err("trail_max_len must be > min_loop_gap".to_string());
        }
        if self.trail_max_len > MAX_TRAIL_LEN {
            return Err(format!("trail_max_len must be <= {}", MAX_TRAIL_LEN));
        }
        if !(3..=MAX_RESAMPLE_POINTS).contains(&self.resample_points) {
            return Err(format!("resample_points must be in 3..={}", MAX_RESAMPLE_POINTS));
        }
        if self.craft_claim_strength == 0 || self.craft_claim_strength > 5 {
            return Err("craft_claim_strength must be in 1..=5".to_string());
        }
        if self.passive_claim_strength >= self.craft_claim_strength {
            return Err("passive_claim_strength must be < craft_claim_strength".to_string());
        }
        Ok(())
    }
}
