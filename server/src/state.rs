use crate::blueprint::BlueprintCatalog;
use crate::craft::{self, CraftEvent};
use crate::player::{color_from_id, Player};
use crate::protocol::{
    CellWire, JoinRequest, PlayerWire, PlayersStateMsg, WelcomeMsg, PROTOCOL_VERSION,
};
use crate::team::Team;
use crate::territory::{Cell, CellChange, TeamScore, TerritoryGrid};
use knitting_shared::config::GameConfig;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};

/// Everything a physics tick produced that clients need to hear about.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Final state of every cell that changed this tick
    pub territory: Vec<CellChange>,
    pub crafts: Vec<CraftEvent>,
}

/// Central game state owned by the game loop task.
pub struct GameState {
    pub config: GameConfig,
    pub players: HashMap<u32, Player>,
    pub territory: TerritoryGrid,
    pub team_score: TeamScore,
    pub catalog: BlueprintCatalog,
    pub rng: ChaCha8Rng,
    next_player_id: u32,
}

impl GameState {
    pub fn new(config: GameConfig, rng_seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            territory: TerritoryGrid::from_config(&config),
            catalog: BlueprintCatalog::from_config(&config),
            players: HashMap::new(),
            team_score: TeamScore::default(),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            next_player_id: 1,
            config,
        }
    }

    /// Add a new player on the smaller team, returns its id.
    pub fn add_player(&mut self, request: JoinRequest) -> u32 {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let team = self.team_for_new_player();
        let name = request.name.unwrap_or_else(|| format!("Knitter-{}", id));
        let color = request.color.unwrap_or_else(|| color_from_id(id));
        let player = Player::spawn(id, name, color, team, &self.config, &mut self.rng);

        tracing::info!(
            "Player {} ({}) joined team {:?} at ({:.0}, {:.0})",
            id,
            player.name,
            team,
            player.position.x,
            player.position.z
        );
        self.players.insert(id, player);
        id
    }

    fn team_for_new_player(&mut self) -> Team {
        let red = self.team_size(Team::Red);
        let blue = self.team_size(Team::Blue);
        match red.cmp(&blue) {
            std::cmp::Ordering::Less => Team::Red,
            std::cmp::Ordering::Greater => Team::Blue,
            std::cmp::Ordering::Equal => {
                if self.rng.gen_bool(0.5) {
                    Team::Red
                } else {
                    Team::Blue
                }
            }
        }
    }

    pub fn team_size(&self, team: Team) -> usize {
        self.players.values().filter(|p| p.team == team).count()
    }

    /// Remove a player. Territory they claimed stays with their team.
    pub fn remove_player(&mut self, id: u32) -> bool {
        self.players.remove(&id).is_some()
    }

    /// Apply a movement input. Input for unknown players is ignored.
    pub fn set_input(&mut self, id: u32, dx: f64, dz: f64) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.set_input(dx, dz, self.config.input_deadzone);
                true
            }
            None => false,
        }
    }

    /// One physics tick: move every player, sample trails, claim and craft.
    pub fn tick(&mut self) -> TickOutcome {
        let Self {
            config,
            players,
            territory,
            catalog,
            ..
        } = self;

        let mut ids: Vec<u32> = players.keys().copied().collect();
        ids.sort_unstable();

        let mut changed: BTreeMap<(usize, usize), Cell> = BTreeMap::new();
        let mut crafts = Vec::new();

        for id in ids {
            let Some(player) = players.get_mut(&id) else {
                continue;
            };
            player.step(config);
            if !player.trail.tick(player.position, config.trail_sample_stride) {
                continue;
            }

            if config.passive_claim_strength > 0 {
                if let Some(cell) = territory.layout().cell_at(player.position) {
                    let changes =
                        territory.claim_cells(&[cell], player.team, config.passive_claim_strength);
                    record(&mut changed, &changes);
                }
            }

            let Some(loop_points) = player
                .trail
                .find_loop(config.closure_radius, config.min_loop_gap as usize)
            else {
                continue;
            };
            match craft::resolve(player, &loop_points, config, catalog, territory) {
                Ok(event) => {
                    tracing::info!(
                        "Player {} crafted a {} ({}) for {} points, {} cells for {:?}",
                        id,
                        event.product,
                        event.blueprint,
                        event.score,
                        event.cells_covered,
                        event.team
                    );
                    record(&mut changed, &event.changes);
                    crafts.push(event);
                }
                Err(rejection) => {
                    tracing::debug!("Player {} loop rejected: {}", id, rejection);
                }
            }
        }

        TickOutcome {
            territory: changed
                .into_iter()
                .map(|((col, row), cell)| CellChange { col, row, cell })
                .collect(),
            crafts,
        }
    }

    /// Score tick: every team earns points for the cells it holds.
    pub fn score_tick(&mut self) -> TeamScore {
        self.territory
            .accrue(&mut self.team_score, self.config.score_per_cell);
        self.team_score
    }

    /// Get players state for broadcasting
    pub fn get_players_state(&self) -> PlayersStateMsg {
        let mut players: Vec<PlayerWire> = self.players.values().map(PlayerWire::from).collect();
        players.sort_by_key(|p| p.id);
        PlayersStateMsg { players }
    }

    /// Welcome for a freshly joined player, including all territory owned so far.
    pub fn welcome(&self, id: u32) -> Option<WelcomeMsg> {
        let player = self.players.get(&id)?;
        Some(WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            self_id: id,
            team: player.team,
            config: self.config.clone(),
            territory: self
                .territory
                .snapshot()
                .iter()
                .map(CellWire::from)
                .collect(),
            team_score: self.team_score.into(),
        })
    }
}

fn record(changed: &mut BTreeMap<(usize, usize), Cell>, changes: &[CellChange]) {
    for change in changes {
        changed.insert((change.col, change.row), change.cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec2::Vec2;

    fn test_state() -> GameState {
        GameState::new(GameConfig::default(), 12345)
    }

    fn join(state: &mut GameState, name: &str) -> u32 {
        state.add_player(JoinRequest {
            name: Some(name.to_string()),
            color: Some(0x336699),
        })
    }

    /// Steer a player around a circle of roughly 100 units until it crafts or time runs out.
    fn steer_in_circle(state: &mut GameState, id: u32, ticks: u32) -> Vec<CraftEvent> {
        let mut crafts = Vec::new();
        for t in 0..ticks {
            let angle = 0.0575 * t as f64;
            state.set_input(id, angle.cos(), angle.sin());
            let outcome = state.tick();
            crafts.extend(outcome.crafts);
            if !crafts.is_empty() {
                break;
            }
        }
        crafts
    }

    #[test]
    fn ids_are_unique_and_defaults_fill_in() {
        let mut state = test_state();
        let a = state.add_player(JoinRequest::default());
        let b = join(&mut state, "Bo");
        assert_ne!(a, b);
        assert_eq!(state.players[&a].name, format!("Knitter-{}", a));
        assert_eq!(state.players[&a].color, color_from_id(a));
        assert_eq!(state.players[&b].color, 0x336699);
    }

    #[test]
    fn teams_stay_balanced() {
        let mut state = test_state();
        for i in 0..10 {
            join(&mut state, &format!("p{}", i));
            let diff = state.team_size(Team::Red) as i64 - state.team_size(Team::Blue) as i64;
            assert!(diff.abs() <= 1);
        }
        assert_eq!(state.team_size(Team::Red), 5);
        assert_eq!(state.team_size(Team::Blue), 5);
    }

    #[test]
    fn input_for_unknown_player_is_ignored() {
        let mut state = test_state();
        assert!(!state.set_input(42, 1.0, 0.0));
    }

    #[test]
    fn players_move_under_input() {
        let mut state = test_state();
        let id = join(&mut state, "Ada");
        let start = state.players[&id].position;
        state.set_input(id, 1.0, 0.0);
        for _ in 0..30 {
            state.tick();
        }
        assert!(state.players[&id].position.x > start.x + 10.0);
    }

    #[test]
    fn passive_claim_marks_cell_under_player() {
        let mut state = test_state();
        let id = join(&mut state, "Ada");
        let team = state.players[&id].team;
        let mut outcome = TickOutcome::default();
        for _ in 0..state.config.trail_sample_stride {
            outcome = state.tick();
        }
        let player = &state.players[&id];
        let (col, row) = state.territory.layout().cell_at(player.position).unwrap();
        assert_eq!(state.territory.get(col, row).unwrap().team, Some(team));
        assert!(outcome
            .territory
            .iter()
            .any(|c| c.col == col && c.row == row));
    }

    #[test]
    fn no_passive_claim_when_disabled() {
        let config = GameConfig {
            passive_claim_strength: 0,
            ..Default::default()
        };
        let mut state = GameState::new(config, 1);
        join(&mut state, "Ada");
        for _ in 0..30 {
            assert!(state.tick().territory.is_empty());
        }
    }

    #[test]
    fn steering_a_circle_crafts_and_claims_territory() {
        let config = GameConfig {
            passive_claim_strength: 0,
            ..Default::default()
        };
        let mut state = GameState::new(config, 5);
        let id = join(&mut state, "Ada");
        {
            let player = state.players.get_mut(&id).unwrap();
            player.position = Vec2::ZERO;
            player.velocity = Vec2::ZERO;
        }
        let team = state.players[&id].team;

        let crafts = steer_in_circle(&mut state, id, 600);
        assert_eq!(crafts.len(), 1);
        let event = &crafts[0];
        assert_eq!(event.blueprint, "circle");
        assert_eq!(event.player_id, id);
        assert!(event.score > 0);
        assert!(!event.changes.is_empty());
        assert_eq!(state.players[&id].score, event.score);
        assert!(state.players[&id].trail.is_empty());
        assert!(state.territory.owned_count(team) > 0);
        assert_eq!(state.territory.owned_count(team.opponent()), 0);
    }

    #[test]
    fn standing_still_never_crafts() {
        let config = GameConfig {
            passive_claim_strength: 0,
            ..Default::default()
        };
        let mut state = GameState::new(config, 5);
        let id = join(&mut state, "Ada");
        state.players.get_mut(&id).unwrap().velocity = Vec2::ZERO;
        for _ in 0..300 {
            let outcome = state.tick();
            assert!(outcome.crafts.is_empty());
            assert!(outcome.territory.is_empty());
        }
        // Rejected loops keep the trail growing
        assert!(state.players[&id].trail.len() > state.config.min_loop_gap as usize);
    }

    #[test]
    fn territory_survives_disconnect() {
        let mut state = test_state();
        let id = join(&mut state, "Ada");
        let team = state.players[&id].team;
        for _ in 0..30 {
            state.tick();
        }
        let owned = state.territory.owned_count(team);
        assert!(owned > 0);
        assert!(state.remove_player(id));
        assert!(!state.remove_player(id));
        assert_eq!(state.territory.owned_count(team), owned);
    }

    #[test]
    fn score_tick_accrues_for_owned_cells() {
        let mut state = test_state();
        state.territory.claim_cells(&[(0, 0), (1, 0)], Team::Red, 2);
        state.territory.claim_cells(&[(5, 5)], Team::Blue, 2);
        let first = state.score_tick();
        assert_eq!(first, TeamScore { red: 2, blue: 1 });
        let second = state.score_tick();
        assert_eq!(second, TeamScore { red: 4, blue: 2 });
    }

    #[test]
    fn welcome_carries_existing_territory() {
        let mut state = test_state();
        state.territory.claim_cells(&[(3, 4), (10, 2)], Team::Blue, 3);
        let id = join(&mut state, "Late");
        let welcome = state.welcome(id).unwrap();
        assert_eq!(welcome.self_id, id);
        assert_eq!(welcome.territory.len(), 2);
        assert!(welcome
            .territory
            .iter()
            .all(|c| c.team == Some(Team::Blue) && c.level == 3));
        assert!(state.welcome(999).is_none());
    }

    #[test]
    fn players_state_is_sorted_and_public() {
        let mut state = test_state();
        let a = join(&mut state, "A");
        let b = join(&mut state, "B");
        let snapshot = state.get_players_state();
        let ids: Vec<u32> = snapshot.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(snapshot.players[0].color, "#336699");
    }
}
