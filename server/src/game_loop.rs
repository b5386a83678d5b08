use crate::config::ServerConfig;
use crate::protocol::{
    territory_update, CraftedMsg, JoinRequest, PlayersStateMsg, TeamScoreMsg, TerritoryUpdateMsg,
    WelcomeMsg,
};
use crate::state::GameState;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from client connections to the game loop
pub enum GameCommand {
    PlayerJoin {
        request: JoinRequest,
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    PlayerInput {
        id: u32,
        dx: f64,
        dz: f64,
    },
    PlayerLeave {
        id: u32,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    PlayersState(PlayersStateMsg),
    TerritoryUpdate(TerritoryUpdateMsg),
    TeamScore(TeamScoreMsg),
    Crafted(CraftedMsg),
}

/// Run the main game loop. Owns all game state.
///
/// Physics ticks, score ticks and commands are handled one at a time, so every mutation of
/// the state runs to completion before the next one starts.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let game_config = server_config.game.clone();
    let mut state = GameState::new(game_config.clone(), server_config.rng_seed);

    let tick_duration = Duration::from_secs_f64(1.0 / game_config.tick_rate_hz as f64);
    let score_duration = Duration::from_secs_f64(1.0 / game_config.score_rate_hz as f64);
    let broadcast_every_n = (game_config.tick_rate_hz / server_config.broadcast_rate_hz).max(1);
    let mut tick_count: u64 = 0;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut score_interval = tokio::time::interval(score_duration);
    score_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick of an interval fires immediately, nothing is owned yet
    score_interval.tick().await;

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let outcome = state.tick();

                if !outcome.territory.is_empty() {
                    let _ = broadcast_tx.send(GameBroadcast::TerritoryUpdate(
                        territory_update(&outcome.territory),
                    ));
                }
                for craft in &outcome.crafts {
                    let _ = broadcast_tx.send(GameBroadcast::Crafted(CraftedMsg::from(craft)));
                }

                tick_count += 1;
                if tick_count % broadcast_every_n as u64 == 0 {
                    let _ = broadcast_tx.send(GameBroadcast::PlayersState(
                        state.get_players_state(),
                    ));
                }
            }

            _ = score_interval.tick() => {
                let totals = state.score_tick();
                let _ = broadcast_tx.send(GameBroadcast::TeamScore(totals.into()));
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    GameCommand::PlayerJoin { request, response } => {
                        let player_id = state.add_player(request);
                        match state.welcome(player_id) {
                            Some(welcome) => {
                                if response.send((player_id, welcome)).is_err() {
                                    // Connection went away while joining
                                    state.remove_player(player_id);
                                }
                            }
                            None => {
                                tracing::error!("Player {} vanished before welcome", player_id);
                            }
                        }
                    }
                    GameCommand::PlayerInput { id, dx, dz } => {
                        if !state.set_input(id, dx, dz) {
                            tracing::debug!("Dropped input for unknown player {}", id);
                        }
                    }
                    GameCommand::PlayerLeave { id } => {
                        if state.remove_player(id) {
                            let _ = broadcast_tx.send(GameBroadcast::PlayersState(
                                state.get_players_state(),
                            ));
                            tracing::info!("Player {} left", id);
                        }
                    }
                }
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}
