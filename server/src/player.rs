use crate::team::Team;
use crate::trail::Trail;
use crate::vec2::{self, Vec2};
use knitting_shared::config::GameConfig;
use rand::Rng;

/// Height of a player's center above the floor. Constant, the simulation is planar.
pub const PLAYER_HEIGHT: f64 = 6.0;

/// Upper bound of the random speed a player spawns with (world units per tick)
const SPAWN_SPEED_MAX: f64 = 2.0;

/// A connected knitter moving around the arena.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// RGB, 0xRRGGBB
    pub color: u32,
    pub team: Team,
    pub position: Vec2,
    /// World units per tick
    pub velocity: Vec2,
    /// Last accepted input direction (unit length)
    pub input_direction: Vec2,
    pub input_active: bool,
    pub score: u64,
    pub trail: Trail,
}

impl Player {
    /// Create a player at a random spot inside the spawn margin, drifting in a random direction.
    pub fn spawn(
        id: u32,
        name: String,
        color: u32,
        team: Team,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let hw = config.half_width() - config.spawn_margin;
        let hh = config.half_height() - config.spawn_margin;
        let position = Vec2::new(rng.gen_range(-hw..hw), rng.gen_range(-hh..hh));

        let heading = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = rng.gen::<f64>() * SPAWN_SPEED_MAX.min(config.max_speed);
        let facing = Vec2::new(heading.cos(), heading.sin());

        Self {
            id,
            name,
            color,
            team,
            position,
            velocity: vec2::scale(facing, speed),
            input_direction: facing,
            input_active: false,
            score: 0,
            trail: Trail::new(config.trail_max_len as usize),
        }
    }

    /// Apply a movement input. Vectors longer than the deadzone become the new direction,
    /// anything shorter releases the input and lets the player coast.
    pub fn set_input(&mut self, dx: f64, dz: f64, deadzone: f64) {
        match vec2::try_normalize(Vec2::new(dx, dz), deadzone) {
            Some(direction) => {
                self.input_direction = direction;
                self.input_active = true;
            }
            None => self.input_active = false,
        }
    }

    /// One fixed-timestep motion update.
    pub fn step(&mut self, config: &GameConfig) {
        if self.input_active {
            let accel = vec2::scale(self.input_direction, config.accel_per_tick());
            self.velocity = vec2::add(self.velocity, accel);
        }

        let speed = self.speed();
        if speed > config.max_speed {
            self.velocity = vec2::scale(self.velocity, config.max_speed / speed);
        }

        self.position = vec2::add(self.position, self.velocity);
        self.velocity = vec2::scale(self.velocity, config.friction);

        let (px, vx) = bounce(
            self.position.x,
            self.velocity.x,
            config.half_width(),
            config.wall_bounce,
        );
        let (pz, vz) = bounce(
            self.position.z,
            self.velocity.z,
            config.half_height(),
            config.wall_bounce,
        );
        self.position = Vec2::new(px, pz);
        self.velocity = Vec2::new(vx, vz);
    }

    pub fn speed(&self) -> f64 {
        vec2::length(self.velocity)
    }
}

/// Clamp one axis to [-half, half] and reflect its velocity inward, damped.
fn bounce(pos: f64, vel: f64, half: f64, damping: f64) -> (f64, f64) {
    if pos > half {
        (half, -vel.abs() * damping)
    } else if pos < -half {
        (-half, vel.abs() * damping)
    } else {
        (pos, vel)
    }
}

/// Generate a color from player ID using golden angle hue distribution.
pub fn color_from_id(id: u32) -> u32 {
    let hue = id.wrapping_mul(137) % 360;
    hsv_to_rgb(hue as f64, 0.55, 0.95)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> u32 {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let ri = ((r + m) * 255.0).round() as u32;
    let gi = ((g + m) * 255.0).round() as u32;
    let bi = ((b + m) * 255.0).round() as u32;

    (ri << 16) | (gi << 8) | bi
}

/// "#rrggbb" form of a packed color.
pub fn css_color(color: u32) -> String {
    format!("#{:06x}", color & 0xFFFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_player(config: &GameConfig) -> Player {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut p = Player::spawn(1, "Ada".to_string(), 0xff0000, Team::Red, config, &mut rng);
        p.position = Vec2::ZERO;
        p.velocity = Vec2::ZERO;
        p
    }

    #[test]
    fn spawn_stays_inside_margin() {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for id in 0..200 {
            let p = Player::spawn(id, String::new(), 0, Team::Blue, &config, &mut rng);
            assert!(p.position.x.abs() <= config.half_width() - config.spawn_margin);
            assert!(p.position.z.abs() <= config.half_height() - config.spawn_margin);
            assert!(p.speed() <= SPAWN_SPEED_MAX + 1e-9);
            assert!(!p.input_active);
            assert!(p.trail.is_empty());
        }
    }

    #[test]
    fn input_above_deadzone_is_normalized() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.set_input(3.0, 4.0, config.input_deadzone);
        assert!(p.input_active);
        assert!((p.input_direction.x - 0.6).abs() < 1e-9);
        assert!((p.input_direction.z - 0.8).abs() < 1e-9);
    }

    #[test]
    fn zero_input_releases_but_keeps_velocity() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.set_input(1.0, 0.0, config.input_deadzone);
        for _ in 0..10 {
            p.step(&config);
        }
        p.set_input(0.0, 0.0, config.input_deadzone);
        assert!(!p.input_active);
        let before = p.velocity;
        p.step(&config);
        assert!(p.velocity.x > 0.0);
        assert!(p.velocity.x < before.x);
    }

    #[test]
    fn non_finite_input_is_released() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.set_input(1.0, 0.0, config.input_deadzone);
        p.set_input(f64::NAN, 0.0, config.input_deadzone);
        assert!(!p.input_active);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let config = GameConfig {
            accel_per_second: 600.0,
            ..Default::default()
        };
        let mut p = test_player(&config);
        p.set_input(1.0, 1.0, config.input_deadzone);
        for _ in 0..300 {
            p.step(&config);
            assert!(p.speed() <= config.max_speed + 1e-9);
        }
    }

    #[test]
    fn coasting_player_comes_to_rest() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.velocity = Vec2::new(5.0, -3.0);
        for _ in 0..400 {
            p.step(&config);
        }
        assert!(p.speed() < 1e-6);
    }

    #[test]
    fn wall_clamps_and_bounces_inward() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.position = Vec2::new(config.half_width() - 1.0, 0.0);
        p.velocity = Vec2::new(5.0, 0.0);
        p.step(&config);
        assert_eq!(p.position.x, config.half_width());
        assert!(p.velocity.x < 0.0);
        assert!(p.velocity.x.abs() < 5.0);

        p.step(&config);
        assert!(p.position.x <= config.half_width());
    }

    #[test]
    fn negative_walls_bounce_too() {
        let config = GameConfig::default();
        let mut p = test_player(&config);
        p.position = Vec2::new(0.0, -config.half_height() + 0.5);
        p.velocity = Vec2::new(0.0, -4.0);
        p.step(&config);
        assert_eq!(p.position.z, -config.half_height());
        assert!(p.velocity.z > 0.0);
    }

    #[test]
    fn color_from_id_produces_valid_rgb() {
        for id in 1..=100 {
            let color = color_from_id(id);
            assert!(color <= 0xFFFFFF, "Color {:#x} out of range for id {}", color, id);
        }
        assert_ne!(color_from_id(1), color_from_id(2));
    }

    #[test]
    fn css_color_is_zero_padded() {
        assert_eq!(css_color(0x00ff0a), "#00ff0a");
    }
}
